// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A minimal stand-in for the build-time task-slot binding used elsewhere in
//! this codebase ([`crate::hl`] doc comment references the syscall-era
//! version). That mechanism patches a placeholder after linking, using a
//! post-compile app descriptor this specification does not define (§9); here
//! the binding happens once, at compile time, via a named constant instead.

/// Names which peer queue a constant in a task's source refers to, purely
/// for readability at call sites — `QueueSlot` carries no runtime state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct QueueSlot(pub &'static str);

impl QueueSlot {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(&self) -> &'static str {
        self.0
    }
}

#[macro_export]
macro_rules! queue_slot {
    ($vis:vis $var:ident, $peer_name:expr) => {
        $vis const $var: $crate::queue_slot::QueueSlot =
            $crate::queue_slot::QueueSlot::new($peer_name);
    };
}
