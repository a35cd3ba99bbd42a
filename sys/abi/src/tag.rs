// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// A 32-bit message tag.
///
/// Tags double as the kind of a message and as the address in whichever
/// protocol state machine is driving a conversation. A tag of `0` is
/// reserved to mean "any tag" when used as a receive filter; it is never a
/// valid tag to send.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Hash, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
#[repr(transparent)]
pub struct MsgTag(pub u32);

impl MsgTag {
    /// Matches every tag when used as a `recv` filter. Only the appid-metadata
    /// SET body loop is allowed to use it.
    pub const ANY: Self = Self(0);

    pub const WINK_REQ: Self = Self(0x4242_0000);
    pub const APDU_CMD_INIT: Self = Self(0xA5A5_0001);
    pub const APDU_CMD_META: Self = Self(0xA5A5_0002);
    pub const APDU_CMD_MSG_LEN: Self = Self(0xA5A5_0003);
    pub const APDU_CMD_MSG: Self = Self(0xA5A5_0004);
    pub const APDU_RESP_INIT: Self = Self(0x5A5A_0001);
    pub const APDU_RESP_MSG_LEN: Self = Self(0x5A5A_0002);
    pub const APDU_RESP_MSG: Self = Self(0x5A5A_0003);
    pub const CMD_RETURN: Self = Self(0xDEAD_BEEF);
    pub const ACKNOWLEDGE: Self = Self(0xEBA4_2148);

    pub const STORAGE_GET_METADATA: Self = Self(0x4F5D_8F4C);
    pub const STORAGE_SET_METADATA: Self = Self(0x8F4C_4F5D);
    pub const APPID_METADATA_IDENTIFIERS: Self = Self(0x4240);
    pub const APPID_METADATA_STATUS: Self = Self(0x4241);
    pub const APPID_METADATA_NAME: Self = Self(0x4242);
    pub const APPID_METADATA_CTR: Self = Self(0x4243);
    pub const APPID_METADATA_FLAGS: Self = Self(0x4244);
    pub const APPID_METADATA_ICON_TYPE: Self = Self(0x4245);
    pub const APPID_METADATA_COLOR: Self = Self(0x4246);
    pub const APPID_METADATA_ICON_START: Self = Self(0x4247);
    pub const APPID_METADATA_ICON: Self = Self(0x4248);
    pub const APPID_METADATA_END: Self = Self(0x4249);

    pub const IS_BACKEND_READY: Self = Self(0x0A46_F8C5);
    pub const BACKEND_IS_READY: Self = Self(0x06E9_F851);
    pub const USER_PRESENCE_REQ: Self = Self(0xAE5D_497F);
    pub const USER_PRESENCE_ACK: Self = Self(0xA97F_E5D4);
    pub const TOKEN_UNLOCKED: Self = Self(0x4F8A_5FED);
    pub const PETPIN_INSERT: Self = Self(0x4513_DF85);
    pub const PETPIN_INSERTED: Self = Self(0xF32E_5A7D);
    pub const USERPIN_INSERT: Self = Self(0x257F_DF45);
    pub const USERPIN_INSERTED: Self = Self(0x532E_FA7D);
    pub const PASSPHRASE_CONFIRM: Self = Self(0x4154_68DF);
    pub const PASSPHRASE_RESULT: Self = Self(0x4F8C_517D);
    pub const STORAGE_GET_ASSETS: Self = Self(0x4ED5_E78C);
    pub const STORAGE_SET_ASSETS_MASTERKEY: Self = Self(0x4ED5_E75E);
    pub const STORAGE_SET_ASSETS_ROLLBK: Self = Self(0x4ED5_E81F);
    pub const STORAGE_SD_ROLLBK_COUNTER: Self = Self(0x4ED8_1A70);
    pub const STORAGE_INC_CTR: Self = Self(0x24A7_FAC1);

    /// True if this tag means "accept whatever arrives next," i.e. `ANY`.
    pub const fn is_any(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for MsgTag {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl From<MsgTag> for u32 {
    fn from(t: MsgTag) -> Self {
        t.0
    }
}
