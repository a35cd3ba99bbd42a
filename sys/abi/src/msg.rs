// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::tag::MsgTag;

/// Largest payload any single datagram can carry. No fragment in this
/// protocol ever exceeds this, by construction (§8 invariant 3).
pub const PAYLOAD_CAPACITY: usize = 64;

/// A fixed-capacity payload buffer, viewed through typed accessors instead of
/// a reinterpret-cast union. Endianness is explicit at every access: the wire
/// format is little-endian throughout.
#[derive(Copy, Clone)]
pub struct Payload(pub [u8; PAYLOAD_CAPACITY]);

impl Default for Payload {
    fn default() -> Self {
        Self([0; PAYLOAD_CAPACITY])
    }
}

impl Payload {
    pub const fn empty() -> Self {
        Self([0; PAYLOAD_CAPACITY])
    }

    /// Builds a payload from a byte slice, zero-padding the remainder.
    ///
    /// Panics if `bytes` is longer than [`PAYLOAD_CAPACITY`]; callers are
    /// expected to have already validated lengths against the 64-byte limit
    /// before reaching this point.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut buf = [0u8; PAYLOAD_CAPACITY];
        buf[..bytes.len()].copy_from_slice(bytes);
        Self(buf)
    }

    pub fn as_bytes(&self) -> &[u8; PAYLOAD_CAPACITY] {
        &self.0
    }

    pub fn bytes(&self, len: usize) -> &[u8] {
        &self.0[..len]
    }

    pub fn as_u16_le(&self) -> u16 {
        u16::from_le_bytes([self.0[0], self.0[1]])
    }

    pub fn as_u32_le(&self) -> u32 {
        u32::from_le_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn write_u16_le(v: u16) -> Self {
        let mut buf = [0u8; PAYLOAD_CAPACITY];
        buf[..2].copy_from_slice(&v.to_le_bytes());
        Self(buf)
    }

    pub fn write_u32_le(v: u32) -> Self {
        let mut buf = [0u8; PAYLOAD_CAPACITY];
        buf[..4].copy_from_slice(&v.to_le_bytes());
        Self(buf)
    }
}

/// A single tagged datagram: a tag, a declared length, and a payload buffer
/// whose bytes past `len` are unspecified.
#[derive(Copy, Clone)]
pub struct Msg {
    pub tag: MsgTag,
    pub len: u8,
    pub payload: Payload,
}

impl Msg {
    pub fn new(tag: MsgTag, bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() <= PAYLOAD_CAPACITY);
        Self {
            tag,
            len: bytes.len() as u8,
            payload: Payload::from_bytes(bytes),
        }
    }

    pub fn empty(tag: MsgTag) -> Self {
        Self::new(tag, &[])
    }

    pub fn bytes(&self) -> &[u8] {
        self.payload.bytes(self.len as usize)
    }
}
