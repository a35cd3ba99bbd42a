// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire types shared between every task in the token firmware: the message
//! tag space, the fixed-shape datagram, the appid-metadata record, and the
//! error kinds the IPC core can return.
//!
//! Everything in this crate is `no_std` and contains no task-specific logic;
//! it is the thing both sides of a conversation link against so that they
//! agree on the wire format without sending any type information.

#![no_std]

mod error;
mod hook;
mod metadata;
mod msg;
mod tag;

pub use error::IpcError;
pub use hook::{CodeRange, Hook, HookTable};
pub use metadata::{
    AppIdMetadata, Icon, IconType, Name, SetMode, ICON_DATA_CAPACITY, NAME_CAPACITY,
};
pub use msg::{Msg, Payload, PAYLOAD_CAPACITY};
pub use tag::MsgTag;
