// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Error kinds the IPC core can hand back to a local caller.
///
/// `Ok` is not a variant here — idiomatic Rust drops it in favor of
/// `Result::Ok`. `Fatal` (§7) is not a variant either: hook address
/// validation failures are unrecoverable and are raised as a genuine
/// `panic!()`, matching the trust-violation policy servers in this codebase
/// already apply (a server that sends back a malformed reply gets the same
/// treatment).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IpcError {
    /// Caller violated a precondition: a NIL buffer with nonzero length, a
    /// length over 64 bytes, a too-small output buffer, or an over-declared
    /// icon length.
    InvalidParam,
    /// The record does not exist (GET), no free slot exists (SET), no
    /// template exists (SET from-template), or the storage collaborator
    /// otherwise reported absence.
    NoStorage,
    /// The underlying queue call failed, or delivered a fragment of
    /// unexpected size for a fixed-size field.
    Transport,
    /// A fragment with an unknown tag arrived in a SET body, or a mandatory
    /// sequence tag arrived out of order.
    Protocol,
    /// Icon allocation failed on GET. Surfaced indirectly as a NIL icon
    /// pointer to the caller; this variant exists for callers that want to
    /// propagate the condition as an error instead.
    NoMem,
}

impl core::fmt::Display for IpcError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            IpcError::InvalidParam => "invalid parameter",
            IpcError::NoStorage => "no such storage record",
            IpcError::Transport => "transport error",
            IpcError::Protocol => "protocol error",
            IpcError::NoMem => "out of memory",
        };
        f.write_str(s)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for IpcError {}
