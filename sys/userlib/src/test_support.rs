// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! An in-memory [`Queue`] double standing in for the kernel message-queue
//! primitive (out of scope, §1) in unit and property tests.
//!
//! `TestQueue` preserves the ordering guarantee the real transport promises
//! (§4.1, §5): datagrams with the same tag are delivered in send order,
//! while `recv` with a different tag filter leaves non-matching messages
//! queued. `recv(MsgTag::ANY, ..)` takes the oldest message regardless of
//! tag, matching the "any tag" filter used by the SET body loop.

use heapless::Vec as HVec;

use abi::{IpcError, MsgTag, PAYLOAD_CAPACITY};

use crate::Queue;

const MAX_QUEUED: usize = 64;

#[derive(Clone)]
struct Queued {
    tag: MsgTag,
    bytes: HVec<u8, PAYLOAD_CAPACITY>,
}

/// A FIFO double for one queue handle. Incoming messages are staged with
/// [`TestQueue::queue_incoming`]; outgoing ones are recorded and can be
/// inspected with [`TestQueue::sent`].
pub struct TestQueue {
    incoming: HVec<Queued, MAX_QUEUED>,
    sent: HVec<(MsgTag, HVec<u8, PAYLOAD_CAPACITY>), MAX_QUEUED>,
}

impl TestQueue {
    pub fn new() -> Self {
        Self {
            incoming: HVec::new(),
            sent: HVec::new(),
        }
    }

    /// Stages a message as if it had already been sent by the peer.
    pub fn queue_incoming(&mut self, tag: MsgTag, bytes: &[u8]) {
        self.incoming
            .push(Queued {
                tag,
                bytes: HVec::from_slice(bytes).expect("fixture exceeds 64 bytes"),
            })
            .ok()
            .expect("test queue full");
    }

    /// Every message sent through this double so far, in send order.
    pub fn sent(&self) -> &[(MsgTag, HVec<u8, PAYLOAD_CAPACITY>)] {
        &self.sent
    }
}

impl Default for TestQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Queue for TestQueue {
    fn send(&mut self, tag: MsgTag, bytes: &[u8]) -> Result<(), IpcError> {
        if bytes.len() > PAYLOAD_CAPACITY {
            return Err(IpcError::InvalidParam);
        }
        self.sent
            .push((tag, HVec::from_slice(bytes).unwrap()))
            .ok()
            .expect("sent log full");
        Ok(())
    }

    fn recv(
        &mut self,
        tag_filter: MsgTag,
        out: &mut [u8],
    ) -> Result<(MsgTag, usize), IpcError> {
        let idx = if tag_filter.is_any() {
            if self.incoming.is_empty() {
                return Err(IpcError::Transport);
            }
            0
        } else {
            self.incoming
                .iter()
                .position(|q| q.tag == tag_filter)
                .ok_or(IpcError::Transport)?
        };
        let msg = self.incoming[idx].clone();
        for i in idx..self.incoming.len() - 1 {
            self.incoming[i] = self.incoming[i + 1].clone();
        }
        self.incoming.pop();
        if msg.bytes.len() > out.len() {
            return Err(IpcError::InvalidParam);
        }
        out[..msg.bytes.len()].copy_from_slice(&msg.bytes);
        Ok((msg.tag, msg.bytes.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_filter_takes_oldest_regardless_of_tag() {
        let mut q = TestQueue::new();
        q.queue_incoming(MsgTag::APPID_METADATA_CTR, &[1, 2, 3, 4]);
        q.queue_incoming(MsgTag::APPID_METADATA_NAME, b"x");
        let mut buf = [0u8; 8];
        let (tag, len) = q.recv(MsgTag::ANY, &mut buf).unwrap();
        assert_eq!(tag, MsgTag::APPID_METADATA_CTR);
        assert_eq!(len, 4);
    }

    #[test]
    fn tag_filter_skips_non_matching_in_queue() {
        let mut q = TestQueue::new();
        q.queue_incoming(MsgTag::APPID_METADATA_NAME, b"x");
        q.queue_incoming(MsgTag::APPID_METADATA_CTR, &[9, 9, 9, 9]);
        let mut buf = [0u8; 8];
        let (tag, len) = q.recv(MsgTag::APPID_METADATA_CTR, &mut buf).unwrap();
        assert_eq!(tag, MsgTag::APPID_METADATA_CTR);
        assert_eq!(len, 4);
        // the NAME message is still queued
        let (tag, _) = q.recv(MsgTag::APPID_METADATA_NAME, &mut buf).unwrap();
        assert_eq!(tag, MsgTag::APPID_METADATA_NAME);
    }
}
