// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The appid-metadata GET/SET sub-protocol (C5/C6): a fragmented, tag-driven
//! wire format that carries one [`AppIdMetadata`] record between a Requester
//! (typically the FIDO task) and a Responder (the storage task) over a
//! [`userlib::Queue`] pair.

#![cfg_attr(not(test), no_std)]

pub mod get;
pub mod set;
pub mod storage;

pub use abi::{AppIdMetadata, Icon, IconType, Name, SetMode, NAME_CAPACITY};
pub use get::{request_get, serve_get};
pub use set::{request_set, serve_set, SetRequest};
pub use storage::{SlotId, StorageBackend};
