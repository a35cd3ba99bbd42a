// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Demo requester: drives a SET followed by a GET against an in-memory
//! storage double and prints the record that comes back.
//!
//! In a real deployment this task and `task-storage` are separate processes
//! joined by a kernel-backed `Queue`; that transport is out of scope here,
//! so both ends of each conversation are run against a fresh [`TestQueue`]
//! in this single process instead.

use abi::{Icon, IpcError, MsgTag, Name};
use appid_metadata::storage::MemoryBackend;
use appid_metadata::{request_get, request_set, serve_get, serve_set, SetMode, SetRequest};
use userlib::queue_slot;
use userlib::test_support::TestQueue;

queue_slot!(STORAGE, "storage");

const DEMO_APPID: [u8; 32] = [0x7a; 32];
const DEMO_KH: [u8; 32] = [0x99; 32];

fn main() -> Result<(), IpcError> {
    println!("requesting against peer queue {:?}", STORAGE.name());
    let mut backend = MemoryBackend::<8>::new();

    let mut name = Name::empty();
    name.set_from_bytes(b"demo-relying-party");

    let mut set_q = TestQueue::new();
    request_set(
        &mut set_q,
        &SetRequest {
            mode: SetMode::NewFromScratch,
            appid: DEMO_APPID,
            kh: DEMO_KH,
            name: Some(name),
            ctr: Some(7),
            flags: Some(1),
            icon: Some(Icon::Color([0x11, 0x22, 0x33])),
        },
    )?;
    serve_set(&mut set_q, &mut backend)?;

    // The responder's half of GET is run into its own queue, then its
    // outgoing fragments are replayed into the queue this requester reads
    // from, standing in for the two processes being joined by a real
    // kernel queue.
    let mut resp_q = TestQueue::new();
    resp_q.queue_incoming(MsgTag::STORAGE_GET_METADATA, &DEMO_APPID);
    serve_get(&mut resp_q, &backend)?;

    let mut req_q = TestQueue::new();
    for (tag, bytes) in resp_q.sent() {
        req_q.queue_incoming(*tag, bytes);
    }
    let record = request_get(&mut req_q, DEMO_APPID)?;

    println!("name: {:?}", core::str::from_utf8(record.name.as_bytes()));
    println!("ctr: {}", record.ctr);
    println!("flags: {}", record.flags);
    Ok(())
}
