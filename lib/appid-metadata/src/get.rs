// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The GET codec (C5): Requester reads one [`AppIdMetadata`] record out of
//! the Responder over a fixed-order tagged fragment stream (§4.4).

use ringbuf::{ringbuf, ringbuf_entry};

use abi::{
    AppIdMetadata, Icon, IconType, IpcError, MsgTag, Name, PAYLOAD_CAPACITY, ICON_DATA_CAPACITY,
};
use userlib::Queue;

use crate::storage::StorageBackend;

/// Responder-side states (§4.6). Exists to name the tracepoints recorded
/// below; the conversation itself is one synchronous top-to-bottom pass, not
/// a re-entrant state machine, since the transport blocks until each reply
/// is consumed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum GetState {
    Start,
    SentStatus,
    SentName,
    SentCtr,
    SentFlags,
    SentIconType,
    SentColor,
    SentIconStart,
    SentIcon,
    SentEnd,
}

ringbuf!(GET_TRACE, GetState, 32, GetState::Start);

/// Serves one GET conversation as the Responder. Blocks until the Requester
/// sends `STORAGE_GET_METADATA` and until every reply is consumed.
pub fn serve_get<Q: Queue>(
    q: &mut Q,
    backend: &impl StorageBackend,
) -> Result<(), IpcError> {
    let mut appid = [0u8; 32];
    let (_, len) = q.recv(MsgTag::STORAGE_GET_METADATA, &mut appid)?;
    if len != 32 {
        return Err(IpcError::Transport);
    }
    ringbuf_entry!(GET_TRACE, GetState::Start);

    let Some(slot) = backend.find_slot_by_appid(&appid) else {
        q.send(MsgTag::APPID_METADATA_STATUS, &[0x00])?;
        ringbuf_entry!(GET_TRACE, GetState::SentStatus);
        q.send(MsgTag::APPID_METADATA_END, &[])?;
        ringbuf_entry!(GET_TRACE, GetState::SentEnd);
        return Ok(());
    };
    let record = backend.get_slot_metadata(slot).ok_or(IpcError::NoStorage)?;

    q.send(MsgTag::APPID_METADATA_STATUS, &[0xFF])?;
    ringbuf_entry!(GET_TRACE, GetState::SentStatus);

    let mut name_wire = [0u8; abi::NAME_CAPACITY + 1];
    let name_len = record.name.to_wire(&mut name_wire);
    q.send(MsgTag::APPID_METADATA_NAME, &name_wire[..name_len])?;
    ringbuf_entry!(GET_TRACE, GetState::SentName);

    q.send(MsgTag::APPID_METADATA_CTR, &record.ctr.to_le_bytes())?;
    ringbuf_entry!(GET_TRACE, GetState::SentCtr);

    q.send(MsgTag::APPID_METADATA_FLAGS, &record.flags.to_le_bytes())?;
    ringbuf_entry!(GET_TRACE, GetState::SentFlags);

    let icon_type = record.icon.icon_type();
    q.send(
        MsgTag::APPID_METADATA_ICON_TYPE,
        &(icon_type as u16).to_le_bytes(),
    )?;
    ringbuf_entry!(GET_TRACE, GetState::SentIconType);

    match record.icon {
        Icon::None => {}
        Icon::Color(rgb) => {
            q.send(MsgTag::APPID_METADATA_COLOR, &rgb)?;
            ringbuf_entry!(GET_TRACE, GetState::SentColor);
        }
        Icon::Image { data, len } => {
            q.send(MsgTag::APPID_METADATA_ICON_START, &len.to_le_bytes())?;
            ringbuf_entry!(GET_TRACE, GetState::SentIconStart);
            let mut sent = 0usize;
            while sent < len as usize {
                let chunk = core::cmp::min(PAYLOAD_CAPACITY, len as usize - sent);
                q.send(MsgTag::APPID_METADATA_ICON, &data[sent..sent + chunk])?;
                ringbuf_entry!(GET_TRACE, GetState::SentIcon);
                sent += chunk;
            }
        }
        // The stored record is never `Unavailable`; that variant is only
        // produced on the Requester side when icon allocation fails.
        Icon::Unavailable(_) => return Err(IpcError::InvalidParam),
    }

    q.send(MsgTag::APPID_METADATA_END, &[])?;
    ringbuf_entry!(GET_TRACE, GetState::SentEnd);
    Ok(())
}

/// Requests one `AppIdMetadata` record as the Requester. On `NoStorage` the
/// `END` fragment has already been consumed.
pub fn request_get<Q: Queue>(q: &mut Q, appid: [u8; 32]) -> Result<AppIdMetadata, IpcError> {
    q.send(MsgTag::STORAGE_GET_METADATA, &appid)?;

    let mut status = [0u8; 1];
    let (_, len) = q.recv(MsgTag::APPID_METADATA_STATUS, &mut status)?;
    if len != 1 {
        return Err(IpcError::Transport);
    }
    if status[0] != 0xFF {
        let mut end = [0u8; 1];
        let (_, len) = q.recv(MsgTag::APPID_METADATA_END, &mut end)?;
        if len != 0 {
            return Err(IpcError::Transport);
        }
        return Err(IpcError::NoStorage);
    }

    let mut name_buf = [0u8; PAYLOAD_CAPACITY];
    let (_, name_len) = q.recv(MsgTag::APPID_METADATA_NAME, &mut name_buf)?;
    let mut name = Name::empty();
    name.set_from_bytes(&name_buf[..name_len]);

    let mut ctr_buf = [0u8; 4];
    let (_, len) = q.recv(MsgTag::APPID_METADATA_CTR, &mut ctr_buf)?;
    if len != 4 {
        return Err(IpcError::Transport);
    }
    let ctr = u32::from_le_bytes(ctr_buf);

    let mut flags_buf = [0u8; 4];
    let (_, len) = q.recv(MsgTag::APPID_METADATA_FLAGS, &mut flags_buf)?;
    if len != 4 {
        return Err(IpcError::Transport);
    }
    let flags = u32::from_le_bytes(flags_buf);

    let mut icon_type_buf = [0u8; 2];
    let (_, len) = q.recv(MsgTag::APPID_METADATA_ICON_TYPE, &mut icon_type_buf)?;
    if len != 2 {
        return Err(IpcError::Transport);
    }
    let icon_type =
        IconType::from_u16(u16::from_le_bytes(icon_type_buf)).ok_or(IpcError::Protocol)?;

    let icon = match icon_type {
        IconType::None => Icon::None,
        IconType::Color => {
            let mut rgb = [0u8; 3];
            let (_, len) = q.recv(MsgTag::APPID_METADATA_COLOR, &mut rgb)?;
            if len != 3 {
                return Err(IpcError::Transport);
            }
            Icon::Color(rgb)
        }
        IconType::Image => {
            let mut icon_len_buf = [0u8; 2];
            let (_, len) = q.recv(MsgTag::APPID_METADATA_ICON_START, &mut icon_len_buf)?;
            if len != 2 {
                return Err(IpcError::Transport);
            }
            let icon_len = u16::from_le_bytes(icon_len_buf);

            if icon_len as usize <= ICON_DATA_CAPACITY {
                let mut data = [0u8; ICON_DATA_CAPACITY];
                let mut received = 0usize;
                while received < icon_len as usize {
                    let mut frag = [0u8; PAYLOAD_CAPACITY];
                    let (_, flen) = q.recv(MsgTag::APPID_METADATA_ICON, &mut frag)?;
                    if received + flen > icon_len as usize {
                        return Err(IpcError::InvalidParam);
                    }
                    data[received..received + flen].copy_from_slice(&frag[..flen]);
                    received += flen;
                }
                Icon::Image { data, len: icon_len }
            } else {
                // Allocation failure: keep consuming ICON fragments so the
                // Responder does not desynchronize, but hand back a marker
                // instead of image bytes (§4.4).
                let mut received = 0usize;
                while received < icon_len as usize {
                    let mut frag = [0u8; PAYLOAD_CAPACITY];
                    let (_, flen) = q.recv(MsgTag::APPID_METADATA_ICON, &mut frag)?;
                    received += flen;
                }
                Icon::Unavailable(icon_len)
            }
        }
    };

    let mut end = [0u8; 1];
    let (_, len) = q.recv(MsgTag::APPID_METADATA_END, &mut end)?;
    if len != 0 {
        return Err(IpcError::Transport);
    }

    Ok(AppIdMetadata {
        appid,
        kh: [0; 32],
        name,
        ctr,
        flags,
        icon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;
    use userlib::test_support::TestQueue;

    #[test]
    fn absent_record_yields_no_storage() {
        let mut q = TestQueue::new();
        q.queue_incoming(MsgTag::STORAGE_GET_METADATA, &[0u8; 32]);
        let backend = MemoryBackend::<4>::new();
        serve_get(&mut q, &backend).unwrap();

        let mut qr = TestQueue::new();
        qr.queue_incoming(MsgTag::APPID_METADATA_STATUS, &[0x00]);
        qr.queue_incoming(MsgTag::APPID_METADATA_END, &[]);
        let err = request_get(&mut qr, [0u8; 32]).unwrap_err();
        assert_eq!(err, IpcError::NoStorage);
    }

    #[test]
    fn color_icon_round_trips() {
        let mut backend = MemoryBackend::<4>::new();
        let appid = [3u8; 32];
        let mut record = AppIdMetadata::zeroed_with_appid(appid);
        record.name.set_from_bytes(b"acme");
        record.ctr = 7;
        record.flags = 0x01;
        record.icon = Icon::Color([0x11, 0x22, 0x33]);
        let slot = backend.find_free_slot().unwrap();
        backend.write_slot(slot, &record).unwrap();

        let mut q = TestQueue::new();
        q.queue_incoming(MsgTag::STORAGE_GET_METADATA, &appid);
        serve_get(&mut q, &backend).unwrap();

        let mut replay = TestQueue::new();
        for (tag, bytes) in q.sent() {
            replay.queue_incoming(*tag, bytes);
        }
        let got = request_get(&mut replay, appid).unwrap();
        assert_eq!(got.name.as_bytes(), b"acme");
        assert_eq!(got.ctr, 7);
        assert_eq!(got.flags, 0x01);
        match got.icon {
            Icon::Color(rgb) => assert_eq!(rgb, [0x11, 0x22, 0x33]),
            other => panic!("expected Color icon, got {:?}", other.icon_type()),
        }
    }

    #[test]
    fn image_icon_of_130_bytes_reconstructs() {
        let mut backend = MemoryBackend::<4>::new();
        let appid = [5u8; 32];
        let mut record = AppIdMetadata::zeroed_with_appid(appid);
        let mut data = [0u8; ICON_DATA_CAPACITY];
        for (i, b) in data[..130].iter_mut().enumerate() {
            *b = i as u8;
        }
        let expected = data;
        record.icon = Icon::Image { data, len: 130 };
        let slot = backend.find_free_slot().unwrap();
        backend.write_slot(slot, &record).unwrap();

        let mut q = TestQueue::new();
        q.queue_incoming(MsgTag::STORAGE_GET_METADATA, &appid);
        serve_get(&mut q, &backend).unwrap();

        let icon_fragments: heapless::Vec<_, 8> = q
            .sent()
            .iter()
            .filter(|(tag, _)| *tag == MsgTag::APPID_METADATA_ICON)
            .collect();
        assert_eq!(icon_fragments.len(), 3);
        assert_eq!(icon_fragments[0].1.len(), 64);
        assert_eq!(icon_fragments[1].1.len(), 64);
        assert_eq!(icon_fragments[2].1.len(), 2);

        let mut replay = TestQueue::new();
        for (tag, bytes) in q.sent() {
            replay.queue_incoming(*tag, bytes);
        }
        let got = request_get(&mut replay, appid).unwrap();
        match got.icon {
            Icon::Image { data, len } => {
                assert_eq!(len, 130);
                assert_eq!(&data[..130], &expected[..130]);
            }
            other => panic!("expected Image icon, got {:?}", other.icon_type()),
        }
    }

    /// Builds an Image icon of `len` bytes, round-trips it through
    /// `serve_get`/`request_get`, and checks both the ICON fragment sizes
    /// the Responder emits and the bytes the Requester reconstructs.
    fn icon_round_trip_boundary(len: u16, expected_frag_lens: &[usize]) {
        let mut backend = MemoryBackend::<4>::new();
        let appid = [len as u8; 32];
        let mut record = AppIdMetadata::zeroed_with_appid(appid);
        let mut data = [0u8; ICON_DATA_CAPACITY];
        for (i, b) in data[..len as usize].iter_mut().enumerate() {
            *b = i as u8;
        }
        let expected = data;
        record.icon = Icon::Image { data, len };
        let slot = backend.find_free_slot().unwrap();
        backend.write_slot(slot, &record).unwrap();

        let mut q = TestQueue::new();
        q.queue_incoming(MsgTag::STORAGE_GET_METADATA, &appid);
        serve_get(&mut q, &backend).unwrap();

        let icon_fragments: heapless::Vec<_, 8> = q
            .sent()
            .iter()
            .filter(|(tag, _)| *tag == MsgTag::APPID_METADATA_ICON)
            .collect();
        assert_eq!(icon_fragments.len(), expected_frag_lens.len());
        for (frag, &expected_len) in icon_fragments.iter().zip(expected_frag_lens) {
            assert_eq!(frag.1.len(), expected_len);
        }

        let mut replay = TestQueue::new();
        for (tag, bytes) in q.sent() {
            replay.queue_incoming(*tag, bytes);
        }
        let got = request_get(&mut replay, appid).unwrap();
        match got.icon {
            Icon::Image { data, len: got_len } => {
                assert_eq!(got_len, len);
                assert_eq!(&data[..len as usize], &expected[..len as usize]);
            }
            other => panic!("expected Image icon, got {:?}", other.icon_type()),
        }
    }

    // Fragmentation boundaries from the chunking loops at the top of this
    // file: 0 (no fragments at all), 1 and 63 (a single short fragment), 64
    // (exactly one full fragment), and 65 = 64*1 + 1 (a full fragment plus a
    // one-byte remainder).
    #[test]
    fn icon_of_0_bytes_sends_no_fragments() {
        icon_round_trip_boundary(0, &[]);
    }

    #[test]
    fn icon_of_1_byte_round_trips() {
        icon_round_trip_boundary(1, &[1]);
    }

    #[test]
    fn icon_of_63_bytes_round_trips() {
        icon_round_trip_boundary(63, &[63]);
    }

    #[test]
    fn icon_of_64_bytes_round_trips() {
        icon_round_trip_boundary(64, &[64]);
    }

    #[test]
    fn icon_of_65_bytes_splits_into_two_fragments() {
        icon_round_trip_boundary(65, &[64, 1]);
    }

    #[test]
    fn oversized_image_icon_is_drained_but_unavailable() {
        let mut q = TestQueue::new();
        // Declare an icon larger than ICON_DATA_CAPACITY and feed two
        // fragments summing to it, as a Responder would.
        let icon_len: u16 = (ICON_DATA_CAPACITY + 10) as u16;
        q.queue_incoming(MsgTag::APPID_METADATA_STATUS, &[0xFF]);
        q.queue_incoming(MsgTag::APPID_METADATA_NAME, b"x\0");
        q.queue_incoming(MsgTag::APPID_METADATA_CTR, &0u32.to_le_bytes());
        q.queue_incoming(MsgTag::APPID_METADATA_FLAGS, &0u32.to_le_bytes());
        q.queue_incoming(
            MsgTag::APPID_METADATA_ICON_TYPE,
            &(IconType::Image as u16).to_le_bytes(),
        );
        q.queue_incoming(MsgTag::APPID_METADATA_ICON_START, &icon_len.to_le_bytes());
        // TestQueue caps a single fragment at PAYLOAD_CAPACITY, so split the
        // declared length into 64-byte pieces like a real Responder would.
        let zeros = [0u8; 64];
        let mut sent = 0usize;
        while sent < icon_len as usize {
            let chunk = core::cmp::min(64, icon_len as usize - sent);
            q.queue_incoming(MsgTag::APPID_METADATA_ICON, &zeros[..chunk]);
            sent += chunk;
        }
        q.queue_incoming(MsgTag::APPID_METADATA_END, &[]);

        let got = request_get(&mut q, [9u8; 32]).unwrap();
        assert_eq!(got.icon.icon_type(), IconType::Image);
        match got.icon {
            Icon::Unavailable(len) => assert_eq!(len, icon_len),
            other => panic!("expected Unavailable, got {:?}", other.icon_type()),
        }
    }
}
