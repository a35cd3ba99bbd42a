// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The five primitive exchange patterns (§4.2).
//!
//! All five are synchronous and blocking: the calling task's control flow
//! blocks inside whichever `Queue::send`/`Queue::recv` call is in progress.
//! None of them spawns anything or owns a thread of control, mirroring the
//! "more ergonomic interface than the raw syscalls" role this module plays
//! for every task built on this library.

use abi::{Hook, HookTable, IpcError, MsgTag, PAYLOAD_CAPACITY};

use crate::Queue;

/// `exchange_data(q, sig, resp, out, in) -> delivered length`.
///
/// Sends one message `(sig, out)`, then receives one message with tag filter
/// `resp` into `in_buf`, returning the number of bytes actually delivered
/// (which may be less than `in_buf.len()`).
pub fn exchange_data<Q: Queue>(
    q: &mut Q,
    sig: MsgTag,
    resp: MsgTag,
    out: &[u8],
    in_buf: &mut [u8],
) -> Result<usize, IpcError> {
    if out.len() > PAYLOAD_CAPACITY || in_buf.len() > PAYLOAD_CAPACITY {
        return Err(IpcError::InvalidParam);
    }
    q.send(sig, out)?;
    let (_, len) = q.recv(resp, in_buf)?;
    Ok(len)
}

/// `send_signal_with_ack(q, sig, resp)`.
///
/// Sends an empty `sig` and waits for an empty `resp`. Used as a barrier or
/// handshake (e.g. `IS_BACKEND_READY` / `BACKEND_IS_READY`).
pub fn send_signal_with_ack<Q: Queue>(
    q: &mut Q,
    sig: MsgTag,
    resp: MsgTag,
) -> Result<(), IpcError> {
    q.send(sig, &[])?;
    let mut scratch = [0u8; PAYLOAD_CAPACITY];
    let (_, len) = q.recv(resp, &mut scratch)?;
    if len != 0 {
        return Err(IpcError::Transport);
    }
    Ok(())
}

/// `relay_with_ack(src, dst, sig, resp)`.
///
/// Receives `sig` from `src`, forwards it verbatim to `dst`, receives `resp`
/// from `dst`, and forwards it verbatim back to `src`. The payload is never
/// interpreted, only copied through.
pub fn relay_with_ack<S: Queue, D: Queue>(
    src: &mut S,
    dst: &mut D,
    sig: MsgTag,
    resp: MsgTag,
) -> Result<(), IpcError> {
    let mut scratch = [0u8; PAYLOAD_CAPACITY];
    let (_, len) = src.recv(sig, &mut scratch)?;
    dst.send(sig, &scratch[..len])?;

    let (_, len) = dst.recv(resp, &mut scratch)?;
    src.send(resp, &scratch[..len])?;
    Ok(())
}

/// `relay_with_hooks(src, dst, sig, resp, pre, post)`.
///
/// Same relay as [`relay_with_ack`], with `pre` invoked after receiving from
/// `src` and before forwarding to `dst`, and `post` invoked after receiving
/// from `dst` and before forwarding back to `src`.
///
/// Both hooks are validated against `table` before being called. Their
/// return values are **advisory**: a hook returning an error does not abort
/// the relay (§9 open question, resolved: only `handle_signal`'s hook return
/// is authoritative).
pub fn relay_with_hooks<S: Queue, D: Queue, E>(
    src: &mut S,
    dst: &mut D,
    sig: MsgTag,
    resp: MsgTag,
    pre: &Hook<'_, dyn Fn() -> Result<(), E>>,
    post: &Hook<'_, dyn Fn() -> Result<(), E>>,
    table: &HookTable,
) -> Result<(), IpcError> {
    let mut scratch = [0u8; PAYLOAD_CAPACITY];
    let (_, len) = src.recv(sig, &mut scratch)?;
    let _ = pre.invoke(table); // advisory: return value discarded
    dst.send(sig, &scratch[..len])?;

    let (_, len) = dst.recv(resp, &mut scratch)?;
    let _ = post.invoke(table); // advisory: return value discarded
    src.send(resp, &scratch[..len])?;
    Ok(())
}

/// `handle_signal(src, sig, resp, hook)`.
///
/// Receives `sig` from `src` and runs `hook()`. `resp` is sent to `src` if
/// and only if the hook succeeds — here the hook's return value IS a veto,
/// unlike [`relay_with_hooks`].
pub fn handle_signal<S: Queue, E>(
    src: &mut S,
    sig: MsgTag,
    resp: MsgTag,
    hook: &Hook<'_, dyn Fn() -> Result<(), E>>,
    table: &HookTable,
) -> Result<(), IpcError> {
    let mut scratch = [0u8; PAYLOAD_CAPACITY];
    src.recv(sig, &mut scratch)?;
    if hook.invoke(table).is_ok() {
        src.send(resp, &[])?;
    }
    Ok(())
}
