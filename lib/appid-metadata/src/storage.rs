// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The persistent-storage collaborator interface consumed by the SET codec
//! (§6): slot lookup, allocation, and the commit write. Slot allocation, wear
//! leveling, and rollback counters live in the real storage task and are out
//! of scope here.

use abi::{AppIdMetadata, IpcError};

/// Opaque handle to a persistent metadata slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SlotId(pub usize);

/// The storage collaborator's interface, implemented by the real storage
/// task and, for tests and the demo `task/storage` binary, by
/// [`MemoryBackend`].
pub trait StorageBackend {
    fn find_slot_by_appid(&self, appid: &[u8; 32]) -> Option<SlotId>;
    fn find_slot_by_appid_and_kh(&self, appid: &[u8; 32], kh: &[u8; 32]) -> Option<SlotId>;
    fn get_slot_metadata(&self, slot: SlotId) -> Option<AppIdMetadata>;
    fn find_free_slot(&mut self) -> Option<SlotId>;
    fn write_slot(&mut self, slot: SlotId, record: &AppIdMetadata) -> Result<(), IpcError>;
}

/// A fixed-capacity, RAM-only [`StorageBackend`] for tests and the demo
/// storage task. Not persistent; slots never wear-level or roll back.
#[cfg(any(test, feature = "test-support"))]
pub struct MemoryBackend<const N: usize> {
    slots: [Option<AppIdMetadata>; N],
}

#[cfg(any(test, feature = "test-support"))]
impl<const N: usize> MemoryBackend<N> {
    pub const fn new() -> Self {
        Self { slots: [None; N] }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl<const N: usize> Default for MemoryBackend<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl<const N: usize> StorageBackend for MemoryBackend<N> {
    fn find_slot_by_appid(&self, appid: &[u8; 32]) -> Option<SlotId> {
        self.slots
            .iter()
            .position(|s| matches!(s, Some(m) if &m.appid == appid))
            .map(SlotId)
    }

    fn find_slot_by_appid_and_kh(&self, appid: &[u8; 32], kh: &[u8; 32]) -> Option<SlotId> {
        self.slots
            .iter()
            .position(|s| matches!(s, Some(m) if &m.appid == appid && &m.kh == kh))
            .map(SlotId)
    }

    fn get_slot_metadata(&self, slot: SlotId) -> Option<AppIdMetadata> {
        self.slots.get(slot.0).copied().flatten()
    }

    fn find_free_slot(&mut self) -> Option<SlotId> {
        self.slots.iter().position(Option::is_none).map(SlotId)
    }

    fn write_slot(&mut self, slot: SlotId, record: &AppIdMetadata) -> Result<(), IpcError> {
        *self.slots.get_mut(slot.0).ok_or(IpcError::NoStorage)? = Some(*record);
        Ok(())
    }
}
