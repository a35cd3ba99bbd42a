// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `AppIdMetadata` record (§3) and its field types.

/// Maximum length of a display name, not counting the NUL terminator
/// the wire format appends.
pub const NAME_CAPACITY: usize = 59;

/// A NUL-terminated, truncating, fixed-capacity display name.
///
/// Unlike an immutable fixed-capacity string, this buffer is written into
/// piecemeal by the GET/SET codecs as wire fragments arrive, so it owns its
/// storage and overwrites in place rather than being constructed once from a
/// `&str`.
#[derive(Copy, Clone)]
pub struct Name {
    buf: [u8; NAME_CAPACITY],
    len: usize,
}

impl Default for Name {
    fn default() -> Self {
        Self { buf: [0; NAME_CAPACITY], len: 0 }
    }
}

impl Name {
    pub const fn empty() -> Self {
        Self { buf: [0; NAME_CAPACITY], len: 0 }
    }

    /// Overwrites the name from raw wire bytes, truncating to
    /// [`NAME_CAPACITY`] if `bytes` is longer (§4.5 NAME row: "truncate to
    /// 59"). A trailing NUL in `bytes`, if present, is not counted as part
    /// of the name.
    pub fn set_from_bytes(&mut self, bytes: &[u8]) {
        let bytes = match bytes.iter().position(|&b| b == 0) {
            Some(nul) => &bytes[..nul],
            None => bytes,
        };
        let len = bytes.len().min(NAME_CAPACITY);
        self.buf = [0; NAME_CAPACITY];
        self.buf[..len].copy_from_slice(&bytes[..len]);
        self.len = len;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Renders the name as a NUL-terminated wire fragment (§4.4: "NUL
    /// terminated, ≤60"). The returned slice is at most `NAME_CAPACITY + 1`
    /// bytes.
    pub fn to_wire(&self, out: &mut [u8; NAME_CAPACITY + 1]) -> usize {
        out[..self.len].copy_from_slice(self.as_bytes());
        out[self.len] = 0;
        self.len + 1
    }
}

/// Which union member `icon` holds.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u16)]
pub enum IconType {
    None = 0,
    Color = 1,
    Image = 2,
}

impl IconType {
    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            0 => Some(IconType::None),
            1 => Some(IconType::Color),
            2 => Some(IconType::Image),
            _ => None,
        }
    }
}

/// Maximum icon image payload this implementation buffers. The original
/// storage engine's icon size limits are out of scope (§1); this is purely a
/// caller-provided-buffer capacity, sized generously for a monochrome or
/// low-color token display icon.
pub const ICON_DATA_CAPACITY: usize = 1024;

/// The `icon` union (§3): absent, a 3-byte RGB color, or image bytes.
#[derive(Copy, Clone)]
pub enum Icon {
    None,
    Color([u8; 3]),
    Image {
        data: [u8; ICON_DATA_CAPACITY],
        len: u16,
    },
    /// The wire declared an IMAGE icon of `icon_len` bytes, but it exceeded
    /// this caller's icon buffer capacity. Per §4.4, allocation failure does
    /// not abort the conversation: all ICON fragments are still consumed to
    /// avoid desynchronizing the Responder, but the caller gets this marker
    /// back instead of image bytes and must treat it as "no icon available."
    Unavailable(u16),
}

impl Icon {
    pub fn icon_type(&self) -> IconType {
        match self {
            Icon::None => IconType::None,
            Icon::Color(_) => IconType::Color,
            Icon::Image { .. } | Icon::Unavailable(_) => IconType::Image,
        }
    }
}

/// The SET conversation's opening mode byte (§4.5).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum SetMode {
    NewFromScratch = 0,
    NewFromTemplate = 1,
    UpdateExisting = 2,
}

impl SetMode {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(SetMode::NewFromScratch),
            1 => Some(SetMode::NewFromTemplate),
            2 => Some(SetMode::UpdateExisting),
            _ => None,
        }
    }
}

/// The full per-appid metadata record (§3).
#[derive(Copy, Clone)]
pub struct AppIdMetadata {
    pub appid: [u8; 32],
    pub kh: [u8; 32],
    pub name: Name,
    pub ctr: u32,
    pub flags: u32,
    pub icon: Icon,
}

impl AppIdMetadata {
    /// A zeroed record with `appid` populated — the `NEW_FROM_SCRATCH`
    /// seeding step (§4.5).
    pub fn zeroed_with_appid(appid: [u8; 32]) -> Self {
        Self {
            appid,
            kh: [0; 32],
            name: Name::empty(),
            ctr: 0,
            flags: 0,
            icon: Icon::None,
        }
    }
}
