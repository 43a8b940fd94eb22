// Copyright 2026 the Relayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic simulation harness for `relayout_core`.
//!
//! - [`SimDocument`] / [`SimHost`] — an in-memory page implementing
//!   [`Host`](relayout_core::host::Host).
//! - [`ManualTimers`] — a clock and timeout queue that only move on request.
//! - [`Harness`] — the three wired to an [`Engine`], plus a counting handler
//!   helper.

#![no_std]

extern crate alloc;

mod document;
mod timers;

pub use document::{MutationKind, SimDocument, SimHost};
pub use timers::ManualTimers;

use alloc::rc::Rc;
use core::cell::Cell;

use relayout_core::engine::Engine;
use relayout_core::host::{ReadyState, Trigger};
use relayout_core::observer::{LayoutObserver, ObserverOptions};
use relayout_core::time::HostTime;

/// A simulated page, its timers, and an engine bound to both.
#[derive(Debug)]
pub struct Harness {
    /// The page.
    pub doc: SimDocument,
    /// The clock and timeout queue.
    pub timers: Rc<ManualTimers>,
    /// The engine under test.
    pub engine: Engine<SimHost>,
}

impl Harness {
    /// Creates a harness whose page starts at `ready`, with the clock at one
    /// second.
    #[must_use]
    pub fn new(ready: ReadyState) -> Self {
        let doc = SimDocument::new(ready);
        let timers = Rc::new(ManualTimers::starting_at(HostTime::from_millis(1_000)));
        let engine = Engine::new(doc.host(), timers.clone());
        Self {
            doc,
            timers,
            engine,
        }
    }

    /// Creates an inactive observer that counts its notifications.
    #[must_use]
    pub fn counting_observer(&self, options: ObserverOptions) -> (LayoutObserver<SimHost>, Counter) {
        let counter = Counter::default();
        let c = counter.clone();
        let observer = LayoutObserver::with_options(
            &self.engine,
            move |trigger: Trigger| c.hit(trigger),
            options,
        );
        (observer, counter)
    }
}

/// Shared notification counter.
#[derive(Clone, Debug, Default)]
pub struct Counter {
    count: Rc<Cell<u32>>,
    last: Rc<Cell<Option<Trigger>>>,
}

impl Counter {
    fn hit(&self, trigger: Trigger) {
        self.count.set(self.count.get() + 1);
        self.last.set(Some(trigger));
    }

    /// Notifications so far.
    #[must_use]
    pub fn get(&self) -> u32 {
        self.count.get()
    }

    /// Trigger of the most recent notification.
    #[must_use]
    pub fn last(&self) -> Option<Trigger> {
        self.last.get()
    }

    /// Resets the count to zero.
    pub fn reset(&self) {
        self.count.set(0);
        self.last.set(None);
    }
}
