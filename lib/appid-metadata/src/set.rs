// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The SET codec (C6): a three-mode update protocol that reconstructs a full
//! [`AppIdMetadata`] record from a tag-driven, order-tolerant fragment
//! stream and commits it via the [`StorageBackend`] collaborator (§4.5).

use ringbuf::{ringbuf, ringbuf_entry};
use unwrap_lite::UnwrapLite;

use abi::{AppIdMetadata, Icon, IconType, IpcError, MsgTag, Name, SetMode, ICON_DATA_CAPACITY};
use userlib::Queue;

use crate::storage::StorageBackend;

/// Responder-side states (§4.6).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum SetState {
    Start,
    GotMode,
    GotIdentifiers,
    Body,
    Commit,
    Done,
}

/// A body fragment that was dropped because it was malformed or arrived in a
/// state that does not accept it (§4.5, §9: ignoring a malformed optional
/// fragment must still be observable).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum SetEvent {
    State(SetState),
    DroppedFragment(MsgTag),
}

ringbuf!(SET_TRACE, SetEvent, 32, SetEvent::State(SetState::Start));

/// Serves one SET conversation as the Responder.
pub fn serve_set<Q: Queue>(q: &mut Q, backend: &mut impl StorageBackend) -> Result<(), IpcError> {
    ringbuf_entry!(SET_TRACE, SetEvent::State(SetState::Start));

    let mut mode_buf = [0u8; 1];
    let (_, len) = q.recv(MsgTag::STORAGE_SET_METADATA, &mut mode_buf)?;
    if len != 1 {
        return Err(IpcError::Transport);
    }
    let mode = SetMode::from_u8(mode_buf[0]).ok_or(IpcError::Protocol)?;
    ringbuf_entry!(SET_TRACE, SetEvent::State(SetState::GotMode));

    let mut ids = [0u8; 64];
    let (_, len) = q.recv(MsgTag::APPID_METADATA_IDENTIFIERS, &mut ids)?;
    if len != 64 {
        return Err(IpcError::Transport);
    }
    let mut appid = [0u8; 32];
    let mut kh = [0u8; 32];
    appid.copy_from_slice(&ids[..32]);
    kh.copy_from_slice(&ids[32..]);
    ringbuf_entry!(SET_TRACE, SetEvent::State(SetState::GotIdentifiers));

    let (mut record, reused_slot) = match mode {
        SetMode::NewFromScratch => (AppIdMetadata::zeroed_with_appid(appid), None),
        SetMode::NewFromTemplate => {
            let template = backend
                .find_slot_by_appid(&appid)
                .ok_or(IpcError::NoStorage)?;
            let record = backend
                .get_slot_metadata(template)
                .ok_or(IpcError::NoStorage)?;
            (record, None)
        }
        SetMode::UpdateExisting => {
            let slot = backend
                .find_slot_by_appid_and_kh(&appid, &kh)
                .ok_or(IpcError::NoStorage)?;
            let record = backend.get_slot_metadata(slot).ok_or(IpcError::NoStorage)?;
            (record, Some(slot))
        }
    };
    record.kh = kh;

    // Seed the icon working state from whatever the record already carries
    // (zero for NEW_FROM_SCRATCH, the template's or existing slot's icon
    // otherwise), so that an icon the body never touches survives the
    // update untouched, the same way `record.name` does.
    let mut icon_type = record.icon.icon_type();
    let mut icon_color = match record.icon {
        Icon::Color(rgb) => rgb,
        _ => [0u8; 3],
    };
    let mut icon_data = match record.icon {
        Icon::Image { data, .. } => data,
        _ => [0u8; ICON_DATA_CAPACITY],
    };
    let mut icon_declared_len: u16 = match record.icon {
        Icon::Image { len, .. } => len,
        _ => 0,
    };
    let mut icon_offset: usize = 0;

    ringbuf_entry!(SET_TRACE, SetEvent::State(SetState::Body));
    loop {
        let mut buf = [0u8; abi::PAYLOAD_CAPACITY];
        let (tag, len) = q.recv(MsgTag::ANY, &mut buf)?;
        match tag {
            MsgTag::APPID_METADATA_NAME => record.name.set_from_bytes(&buf[..len]),
            MsgTag::APPID_METADATA_CTR => {
                if len == 4 {
                    record.ctr = u32::from_le_bytes(buf[..4].try_into().unwrap_lite());
                } else {
                    ringbuf_entry!(SET_TRACE, SetEvent::DroppedFragment(tag));
                }
            }
            MsgTag::APPID_METADATA_FLAGS => {
                if len == 4 {
                    record.flags = u32::from_le_bytes(buf[..4].try_into().unwrap_lite());
                } else {
                    ringbuf_entry!(SET_TRACE, SetEvent::DroppedFragment(tag));
                }
            }
            MsgTag::APPID_METADATA_ICON_TYPE => {
                if len == 2 {
                    if let Some(t) = IconType::from_u16(u16::from_le_bytes(
                        buf[..2].try_into().unwrap_lite(),
                    )) {
                        icon_type = t;
                        continue;
                    }
                }
                ringbuf_entry!(SET_TRACE, SetEvent::DroppedFragment(tag));
            }
            MsgTag::APPID_METADATA_COLOR => {
                if len == 3 && icon_type == IconType::Color {
                    icon_color.copy_from_slice(&buf[..3]);
                } else {
                    ringbuf_entry!(SET_TRACE, SetEvent::DroppedFragment(tag));
                }
            }
            MsgTag::APPID_METADATA_ICON_START => {
                if len == 2 && icon_type == IconType::Image {
                    let declared = u16::from_le_bytes(buf[..2].try_into().unwrap_lite());
                    if declared as usize > ICON_DATA_CAPACITY {
                        return Err(IpcError::NoStorage);
                    }
                    icon_declared_len = declared;
                    icon_offset = 0;
                } else {
                    ringbuf_entry!(SET_TRACE, SetEvent::DroppedFragment(tag));
                }
            }
            MsgTag::APPID_METADATA_ICON => {
                if icon_type == IconType::Image
                    && icon_offset + len <= icon_declared_len as usize
                {
                    icon_data[icon_offset..icon_offset + len].copy_from_slice(&buf[..len]);
                    icon_offset += len;
                } else {
                    ringbuf_entry!(SET_TRACE, SetEvent::DroppedFragment(tag));
                }
            }
            MsgTag::APPID_METADATA_END => break,
            _ => return Err(IpcError::Protocol),
        }
    }

    record.icon = match icon_type {
        IconType::None => Icon::None,
        IconType::Color => Icon::Color(icon_color),
        IconType::Image => Icon::Image {
            data: icon_data,
            len: icon_declared_len,
        },
    };

    ringbuf_entry!(SET_TRACE, SetEvent::State(SetState::Commit));
    let target = match mode {
        SetMode::NewFromScratch | SetMode::NewFromTemplate => {
            backend.find_free_slot().ok_or(IpcError::NoStorage)?
        }
        SetMode::UpdateExisting => reused_slot.unwrap_lite(),
    };
    backend.write_slot(target, &record)?;
    ringbuf_entry!(SET_TRACE, SetEvent::State(SetState::Done));
    Ok(())
}

/// A Requester-side SET request, for tests and `task/fido`. Fields left
/// `None` are simply not sent; the Responder's body loop tolerates any
/// subset.
pub struct SetRequest {
    pub mode: SetMode,
    pub appid: [u8; 32],
    pub kh: [u8; 32],
    pub name: Option<Name>,
    pub ctr: Option<u32>,
    pub flags: Option<u32>,
    pub icon: Option<Icon>,
}

/// Drives one SET conversation as the Requester, sending fields in a fixed
/// canonical order. The wire format itself tolerates any order; this
/// encoder simply doesn't need to exercise that tolerance.
pub fn request_set<Q: Queue>(q: &mut Q, req: &SetRequest) -> Result<(), IpcError> {
    q.send(MsgTag::STORAGE_SET_METADATA, &[req.mode as u8])?;
    let mut ids = [0u8; 64];
    ids[..32].copy_from_slice(&req.appid);
    ids[32..].copy_from_slice(&req.kh);
    q.send(MsgTag::APPID_METADATA_IDENTIFIERS, &ids)?;

    if let Some(name) = &req.name {
        let mut wire = [0u8; abi::NAME_CAPACITY + 1];
        let len = name.to_wire(&mut wire);
        q.send(MsgTag::APPID_METADATA_NAME, &wire[..len])?;
    }
    if let Some(ctr) = req.ctr {
        q.send(MsgTag::APPID_METADATA_CTR, &ctr.to_le_bytes())?;
    }
    if let Some(flags) = req.flags {
        q.send(MsgTag::APPID_METADATA_FLAGS, &flags.to_le_bytes())?;
    }
    if let Some(icon) = &req.icon {
        let icon_type = icon.icon_type();
        q.send(
            MsgTag::APPID_METADATA_ICON_TYPE,
            &(icon_type as u16).to_le_bytes(),
        )?;
        match icon {
            Icon::Color(rgb) => q.send(MsgTag::APPID_METADATA_COLOR, rgb)?,
            Icon::Image { data, len } => {
                q.send(MsgTag::APPID_METADATA_ICON_START, &len.to_le_bytes())?;
                let mut sent = 0usize;
                while sent < *len as usize {
                    let chunk = core::cmp::min(abi::PAYLOAD_CAPACITY, *len as usize - sent);
                    q.send(MsgTag::APPID_METADATA_ICON, &data[sent..sent + chunk])?;
                    sent += chunk;
                }
            }
            Icon::None | Icon::Unavailable(_) => {}
        }
    }
    q.send(MsgTag::APPID_METADATA_END, &[])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;
    use userlib::test_support::TestQueue;

    #[test]
    fn from_scratch_minimal_commits_zeroed_record() {
        let mut backend = MemoryBackend::<4>::new();
        let appid = [1u8; 32];
        let kh = [2u8; 32];
        let mut q = TestQueue::new();
        q.queue_incoming(MsgTag::STORAGE_SET_METADATA, &[SetMode::NewFromScratch as u8]);
        let mut ids = [0u8; 64];
        ids[..32].copy_from_slice(&appid);
        ids[32..].copy_from_slice(&kh);
        q.queue_incoming(MsgTag::APPID_METADATA_IDENTIFIERS, &ids);
        q.queue_incoming(MsgTag::APPID_METADATA_END, &[]);

        serve_set(&mut q, &mut backend).unwrap();

        let slot = backend.find_slot_by_appid(&appid).unwrap();
        let record = backend.get_slot_metadata(slot).unwrap();
        assert_eq!(record.appid, appid);
        assert_eq!(record.kh, kh);
        assert_eq!(record.ctr, 0);
        assert_eq!(record.name.as_bytes(), b"");
    }

    #[test]
    fn update_existing_rewrites_only_ctr() {
        let mut backend = MemoryBackend::<4>::new();
        let appid = [3u8; 32];
        let kh = [4u8; 32];
        let mut seed = AppIdMetadata::zeroed_with_appid(appid);
        seed.kh = kh;
        seed.ctr = 5;
        seed.name.set_from_bytes(b"acme");
        let slot = backend.find_free_slot().unwrap();
        backend.write_slot(slot, &seed).unwrap();

        let mut q = TestQueue::new();
        q.queue_incoming(MsgTag::STORAGE_SET_METADATA, &[SetMode::UpdateExisting as u8]);
        let mut ids = [0u8; 64];
        ids[..32].copy_from_slice(&appid);
        ids[32..].copy_from_slice(&kh);
        q.queue_incoming(MsgTag::APPID_METADATA_IDENTIFIERS, &ids);
        q.queue_incoming(MsgTag::APPID_METADATA_CTR, &0x42u32.to_le_bytes());
        q.queue_incoming(MsgTag::APPID_METADATA_END, &[]);

        serve_set(&mut q, &mut backend).unwrap();

        let record = backend.get_slot_metadata(slot).unwrap();
        assert_eq!(record.ctr, 0x42);
        assert_eq!(record.name.as_bytes(), b"acme");
    }

    #[test]
    fn update_existing_preserves_untouched_icon() {
        let mut backend = MemoryBackend::<4>::new();
        let appid = [6u8; 32];
        let kh = [7u8; 32];
        let mut seed = AppIdMetadata::zeroed_with_appid(appid);
        seed.kh = kh;
        seed.icon = Icon::Color([0xAA, 0xBB, 0xCC]);
        let slot = backend.find_free_slot().unwrap();
        backend.write_slot(slot, &seed).unwrap();

        let mut q = TestQueue::new();
        q.queue_incoming(
            MsgTag::STORAGE_SET_METADATA,
            &[SetMode::UpdateExisting as u8],
        );
        let mut ids = [0u8; 64];
        ids[..32].copy_from_slice(&appid);
        ids[32..].copy_from_slice(&kh);
        q.queue_incoming(MsgTag::APPID_METADATA_IDENTIFIERS, &ids);
        q.queue_incoming(MsgTag::APPID_METADATA_CTR, &9u32.to_le_bytes());
        q.queue_incoming(MsgTag::APPID_METADATA_END, &[]);

        serve_set(&mut q, &mut backend).unwrap();

        let record = backend.get_slot_metadata(slot).unwrap();
        assert_eq!(record.ctr, 9);
        match record.icon {
            Icon::Color(rgb) => assert_eq!(rgb, [0xAA, 0xBB, 0xCC]),
            other => panic!("expected Color icon, got {:?}", other.icon_type()),
        }
    }

    #[test]
    fn body_fragment_order_is_immaterial() {
        let fragments = |order: &[(MsgTag, &[u8])]| -> MemoryBackend<4> {
            let mut backend = MemoryBackend::<4>::new();
            let appid = [9u8; 32];
            let kh = [8u8; 32];
            let mut q = TestQueue::new();
            q.queue_incoming(
                MsgTag::STORAGE_SET_METADATA,
                &[SetMode::NewFromScratch as u8],
            );
            let mut ids = [0u8; 64];
            ids[..32].copy_from_slice(&appid);
            ids[32..].copy_from_slice(&kh);
            q.queue_incoming(MsgTag::APPID_METADATA_IDENTIFIERS, &ids);
            for (tag, bytes) in order {
                q.queue_incoming(*tag, bytes);
            }
            q.queue_incoming(MsgTag::APPID_METADATA_END, &[]);
            serve_set(&mut q, &mut backend).unwrap();
            backend
        };

        let ctr_a = 1u32.to_le_bytes();
        let ctr_b = 2u32.to_le_bytes();
        let flags = 0x55u32.to_le_bytes();

        let forward = fragments(&[
            (MsgTag::APPID_METADATA_CTR, &ctr_a),
            (MsgTag::APPID_METADATA_CTR, &ctr_b),
            (MsgTag::APPID_METADATA_FLAGS, &flags),
        ]);
        let reversed = fragments(&[
            (MsgTag::APPID_METADATA_FLAGS, &flags),
            (MsgTag::APPID_METADATA_CTR, &ctr_a),
            (MsgTag::APPID_METADATA_CTR, &ctr_b),
        ]);

        let slot = forward.find_slot_by_appid(&[9u8; 32]).unwrap();
        let a = forward.get_slot_metadata(slot).unwrap();
        let b = reversed.get_slot_metadata(slot).unwrap();
        assert_eq!(a.ctr, 2);
        assert_eq!(a.flags, 0x55);
        assert_eq!(a.ctr, b.ctr);
        assert_eq!(a.flags, b.flags);
    }

    #[test]
    fn unknown_tag_in_body_is_protocol_error() {
        let mut backend = MemoryBackend::<4>::new();
        let mut q = TestQueue::new();
        q.queue_incoming(
            MsgTag::STORAGE_SET_METADATA,
            &[SetMode::NewFromScratch as u8],
        );
        q.queue_incoming(MsgTag::APPID_METADATA_IDENTIFIERS, &[0u8; 64]);
        q.queue_incoming(MsgTag::WINK_REQ, &[]);

        let err = serve_set(&mut q, &mut backend).unwrap_err();
        assert_eq!(err, IpcError::Protocol);
    }

    #[test]
    fn update_existing_without_match_is_no_storage() {
        let mut backend = MemoryBackend::<4>::new();
        let mut q = TestQueue::new();
        q.queue_incoming(
            MsgTag::STORAGE_SET_METADATA,
            &[SetMode::UpdateExisting as u8],
        );
        q.queue_incoming(MsgTag::APPID_METADATA_IDENTIFIERS, &[0u8; 64]);
        let err = serve_set(&mut q, &mut backend).unwrap_err();
        assert_eq!(err, IpcError::NoStorage);
    }
}
