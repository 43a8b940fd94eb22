// Copyright 2026 the Relayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window events that can change layout without mutating the DOM tree.
//!
//! A mutation observer sees tree edits but misses resizes, animations,
//! transitions, form input, print transitions and orientation changes. Every
//! name in [`EVENT_TYPES`] gets one bubbling-phase listener on the window while
//! the engine is observing.
//!
//! The list includes vendor-prefixed spellings of the animation and transition
//! lifecycle events. Names are case-sensitive.

use core::fmt;

/// The fixed event catalog, in registration order.
pub const EVENT_TYPES: [&str; 32] = [
    "resize",
    "animationstart",
    "webkitAnimationStart",
    "animationiteration",
    "webkitAnimationIteration",
    "animationend",
    "webkitAnimationEnd",
    "input",
    "mouseup",
    "mousedown",
    "orientationchange",
    "afterprint",
    "beforeprint",
    "readystatechange",
    "touchstart",
    "touchend",
    "touchcancel",
    "transitionstart",
    "webkitTransitionStart",
    "MSTransitionStart",
    "oTransitionStart",
    "otransitionstart",
    "transitioniteration",
    "webkitTransitionIteration",
    "MSTransitionIteration",
    "oTransitionIteration",
    "otransitioniteration",
    "transitionend",
    "webkitTransitionEnd",
    "MSTransitionEnd",
    "oTransitionEnd",
    "otransitionend",
];

/// One entry of [`EVENT_TYPES`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventType(u8);

impl EventType {
    /// Number of catalog entries.
    pub const COUNT: usize = EVENT_TYPES.len();

    /// Returns the entry at `index`, if in range.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::COUNT {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "index is bounded by the 32-entry catalog"
            )]
            let index = index as u8;
            Some(Self(index))
        } else {
            None
        }
    }

    /// Looks up an entry by its exact (case-sensitive) DOM event name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        EVENT_TYPES
            .iter()
            .position(|&n| n == name)
            .and_then(Self::from_index)
    }

    /// Iterates over the catalog in registration order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..Self::COUNT).filter_map(Self::from_index)
    }

    /// Position in the catalog.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// DOM event name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        EVENT_TYPES[self.0 as usize]
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventType({})", self.name())
    }
}
