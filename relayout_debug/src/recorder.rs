// Copyright 2026 the Relayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] by appending every event to a
//! shared buffer. The engine takes ownership of the boxed sink, so keep a
//! clone to read the recording back:
//!
//! ```rust,ignore
//! let recorder = RecorderSink::new();
//! engine.set_trace_sink(Some(Box::new(recorder.clone())));
//! // ...
//! for event in recorder.events() { /* ... */ }
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use relayout_core::trace::{
    DispatchEvent, LifecycleEvent, RegistrationEvent, ThrottleEvent, TraceSink,
};

/// One recorded trace event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// See [`TraceSink::on_lifecycle`].
    Lifecycle(LifecycleEvent),
    /// See [`TraceSink::on_registration`].
    Registration(RegistrationEvent),
    /// See [`TraceSink::on_dispatch`].
    Dispatch(DispatchEvent),
    /// See [`TraceSink::on_throttle`].
    Throttle(ThrottleEvent),
}

/// A [`TraceSink`] that keeps every event. Clones share the buffer.
#[derive(Clone, Debug, Default)]
pub struct RecorderSink {
    events: Rc<RefCell<Vec<RecordedEvent>>>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Discards the recording.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn push(&self, event: RecordedEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl TraceSink for RecorderSink {
    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        self.push(RecordedEvent::Lifecycle(*e));
    }

    fn on_registration(&mut self, e: &RegistrationEvent) {
        self.push(RecordedEvent::Registration(*e));
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        self.push(RecordedEvent::Dispatch(*e));
    }

    fn on_throttle(&mut self, e: &ThrottleEvent) {
        self.push(RecordedEvent::Throttle(*e));
    }
}
