// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Demo responder: seeds one record in an in-memory slot table and serves a
//! single GET conversation over it.
//!
//! The kernel message queue this task would really hold a handle to is out
//! of scope; [`TestQueue`] stands in for it here, the same way it does in
//! `appid-metadata`'s own test suite. A real deployment swaps it for a
//! syscall-backed `Queue` without touching `serve_get`/`serve_set`.

use abi::{AppIdMetadata, Icon, IpcError, MsgTag};
use appid_metadata::storage::MemoryBackend;
use appid_metadata::{serve_get, StorageBackend};
use unwrap_lite::UnwrapLite;
use userlib::queue_slot;
use userlib::test_support::TestQueue;

queue_slot!(FIDO, "fido");

const DEMO_APPID: [u8; 32] = [0x42; 32];

fn main() -> Result<(), IpcError> {
    println!("serving requests from peer queue {:?}", FIDO.name());
    let mut backend = MemoryBackend::<8>::new();

    let mut record = AppIdMetadata::zeroed_with_appid(DEMO_APPID);
    record.name.set_from_bytes(b"acme-token");
    record.ctr = 1;
    record.icon = Icon::Color([0x11, 0x22, 0x33]);
    let slot = backend.find_free_slot().unwrap_lite();
    backend.write_slot(slot, &record).unwrap_lite();

    let mut q = TestQueue::new();
    q.queue_incoming(MsgTag::STORAGE_GET_METADATA, &DEMO_APPID);
    serve_get(&mut q, &backend)?;

    for (tag, bytes) in q.sent() {
        println!("sent {:?}: {} bytes", tag, bytes.len());
    }
    Ok(())
}
