// Copyright 2026 the Relayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles shared by the unit tests of this crate.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::catalog::EventType;
use crate::host::{Host, Notifier, ReadyState, TimeoutId, Timers};
use crate::time::{Duration, HostTime};

/// Records host calls and keeps the last notifier it was handed.
#[derive(Debug)]
pub(crate) struct RecordingHost {
    pub(crate) ready: ReadyState,
    pub(crate) log: Rc<RefCell<Vec<String>>>,
    pub(crate) notifier: Rc<RefCell<Option<Notifier>>>,
}

impl RecordingHost {
    pub(crate) fn new(ready: ReadyState) -> Self {
        Self {
            ready,
            log: Rc::new(RefCell::new(Vec::new())),
            notifier: Rc::new(RefCell::new(None)),
        }
    }

    fn record(&self, entry: &str) {
        self.log.borrow_mut().push(String::from(entry));
    }
}

impl Host for RecordingHost {
    fn ready_state(&self) -> ReadyState {
        self.ready
    }
    fn observe_mutations(&mut self, notifier: Notifier) {
        self.record("observe");
        *self.notifier.borrow_mut() = Some(notifier);
    }
    fn disconnect_mutations(&mut self) {
        self.record("disconnect");
    }
    fn add_window_listener(&mut self, _event: EventType, _notifier: Notifier) {
        self.record("+window");
    }
    fn remove_window_listener(&mut self, _event: EventType) {
        self.record("-window");
    }
    fn add_load_listener(&mut self, _notifier: Notifier) {
        self.record("+load");
    }
    fn remove_load_listener(&mut self) {
        self.record("-load");
    }
    fn add_ready_listener(&mut self, notifier: Notifier) {
        self.record("+ready");
        *self.notifier.borrow_mut() = Some(notifier);
    }
    fn remove_ready_listener(&mut self) {
        self.record("-ready");
    }
}

struct Pending {
    id: u32,
    due: HostTime,
    callback: Box<dyn FnOnce()>,
}

/// Manually stepped clock with a timeout queue.
#[derive(Default)]
pub(crate) struct StepTimers {
    now: Cell<u64>,
    next_id: Cell<u32>,
    queue: RefCell<Vec<Pending>>,
}

impl core::fmt::Debug for StepTimers {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StepTimers")
            .field("now", &self.now.get())
            .field("pending", &self.queue.borrow().len())
            .finish_non_exhaustive()
    }
}

impl StepTimers {
    /// Sets the clock without running anything (may go backwards).
    pub(crate) fn set_now(&self, t: HostTime) {
        self.now.set(t.0);
    }

    /// Moves the clock forward, firing due timeouts in deadline order.
    pub(crate) fn advance(&self, by: Duration) {
        let target = self.now.get() + by.0;
        loop {
            let next = {
                let mut queue = self.queue.borrow_mut();
                let due = queue
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.due.0 <= target)
                    .min_by_key(|(_, p)| (p.due, p.id))
                    .map(|(i, _)| i);
                due.map(|i| queue.remove(i))
            };
            let Some(pending) = next else { break };
            self.now.set(pending.due.0.max(self.now.get()));
            (pending.callback)();
        }
        self.now.set(target);
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl Timers for StepTimers {
    fn now(&self) -> HostTime {
        HostTime(self.now.get())
    }

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimeoutId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.queue.borrow_mut().push(Pending {
            id,
            due: HostTime(self.now.get() + delay.0),
            callback,
        });
        TimeoutId(id)
    }

    fn clear_timeout(&self, id: TimeoutId) {
        self.queue.borrow_mut().retain(|p| p.id != id.0);
    }
}
