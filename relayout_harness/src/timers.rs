// Copyright 2026 the Relayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Manually driven clock and timeout queue.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use relayout_core::host::{TimeoutId, Timers};
use relayout_core::time::{Duration, HostTime};

struct Scheduled {
    id: u32,
    due: HostTime,
    callback: Box<dyn FnOnce()>,
}

/// A [`Timers`] implementation whose clock only moves when told to.
///
/// Timeouts fire during [`advance`](Self::advance), in deadline order (ties in
/// scheduling order), with the clock set to each timeout's deadline while it
/// runs. Timeouts scheduled by a running callback fire in the same `advance`
/// call if they fall due before its target.
#[derive(Default)]
pub struct ManualTimers {
    now: Cell<u64>,
    next_id: Cell<u32>,
    queue: RefCell<Vec<Scheduled>>,
    fired: Cell<u64>,
}

impl core::fmt::Debug for ManualTimers {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ManualTimers")
            .field("now", &HostTime(self.now.get()))
            .field("pending", &self.pending())
            .field("fired", &self.fired.get())
            .finish_non_exhaustive()
    }
}

impl ManualTimers {
    /// Creates timers with the clock at `start`.
    #[must_use]
    pub fn starting_at(start: HostTime) -> Self {
        let timers = Self::default();
        timers.now.set(start.0);
        timers
    }

    /// Jumps the clock to `t` without running timeouts. `t` may be in the past.
    pub fn set_now(&self, t: HostTime) {
        self.now.set(t.0);
    }

    /// Moves the clock forward by `by`, running every timeout that falls due.
    pub fn advance(&self, by: Duration) {
        let target = self.now.get().saturating_add(by.0);
        while let Some(next) = self.pop_due(target) {
            self.now.set(next.due.0.max(self.now.get()));
            self.fired.set(self.fired.get() + 1);
            (next.callback)();
        }
        self.now.set(target);
    }

    /// Number of scheduled timeouts.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Number of timeouts that have fired so far.
    #[must_use]
    pub fn fired(&self) -> u64 {
        self.fired.get()
    }

    fn pop_due(&self, target: u64) -> Option<Scheduled> {
        let mut queue = self.queue.borrow_mut();
        let idx = queue
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due.0 <= target)
            .min_by_key(|(_, s)| (s.due, s.id))
            .map(|(i, _)| i)?;
        Some(queue.remove(idx))
    }
}

impl Timers for ManualTimers {
    fn now(&self) -> HostTime {
        HostTime(self.now.get())
    }

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimeoutId {
        let id = self.next_id.get().wrapping_add(1);
        self.next_id.set(id);
        self.queue.borrow_mut().push(Scheduled {
            id,
            due: HostTime(self.now.get().saturating_add(delay.0)),
            callback,
        });
        TimeoutId(id)
    }

    fn clear_timeout(&self, id: TimeoutId) {
        self.queue.borrow_mut().retain(|s| s.id != id.0);
    }
}
