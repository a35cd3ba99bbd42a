// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport trait and the five primitive exchange patterns (C1/C3) that
//! every task in the token firmware builds its protocol conversations out
//! of.
//!
//! This crate does not talk to a real kernel message queue; it defines the
//! [`Queue`] trait that a real syscall-backed implementation satisfies, and
//! builds the exchange patterns entirely in terms of that trait so they can
//! be unit-tested against an in-memory double (see [`test_support`]).

#![no_std]

pub mod hl;
pub mod queue_slot;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use abi::{IpcError, Msg, MsgTag, Payload, PAYLOAD_CAPACITY};

/// The one trait a kernel message-queue primitive must satisfy for the
/// exchange patterns in [`hl`] to be usable (§4.1).
///
/// Implementations are blocking: `recv` does not return until a message
/// matching `tag_filter` arrives. A `tag_filter` of [`MsgTag::ANY`] matches
/// any tag; only the appid-metadata SET body loop uses it (§4.1).
pub trait Queue {
    /// Enqueues one datagram. `bytes.len()` must be `<= PAYLOAD_CAPACITY`;
    /// callers are expected to have validated this already (§4.1).
    fn send(&mut self, tag: MsgTag, bytes: &[u8]) -> Result<(), IpcError>;

    /// Dequeues the next datagram whose tag equals `tag_filter`, blocking
    /// until one arrives. Returns the tag actually received (always equal
    /// to `tag_filter` unless it was [`MsgTag::ANY`]) and the number of
    /// bytes written into `out`.
    fn recv(
        &mut self,
        tag_filter: MsgTag,
        out: &mut [u8],
    ) -> Result<(MsgTag, usize), IpcError>;
}
