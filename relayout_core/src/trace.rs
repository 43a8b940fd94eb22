// Copyright 2026 the Relayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostics hooks for the engine and the rate limiter.
//!
//! [`TraceSink`] has one method per event kind, all defaulting to no-ops.
//! Install a sink with [`Engine::set_trace_sink`]; it also receives events
//! from every throttled [`LayoutObserver`] created against that engine.
//!
//! When the `trace` feature is **off**, the emission sites compile to nothing
//! and an installed sink is never called.
//!
//! [`Engine::set_trace_sink`]: crate::engine::Engine::set_trace_sink
//! [`LayoutObserver`]: crate::observer::LayoutObserver

use alloc::boxed::Box;
use core::cell::RefCell;

use crate::engine::Lifecycle;
use crate::host::Trigger;
use crate::time::{Duration, HostTime};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted on every lifecycle transition of the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifecycleEvent {
    /// Host time of the transition.
    pub timestamp: HostTime,
    /// State before.
    pub from: Lifecycle,
    /// State after.
    pub to: Lifecycle,
}

/// Outcome of a register or unregister call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegistrationKind {
    /// The handler was added.
    Added,
    /// The handler was already registered.
    Duplicate,
    /// The handler was removed.
    Removed,
    /// The handler was not registered.
    Unknown,
}

/// Emitted on every register/unregister call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistrationEvent {
    /// Host time of the call.
    pub timestamp: HostTime,
    /// What happened.
    pub kind: RegistrationKind,
    /// Registration set size after the call.
    pub handler_count: usize,
}

/// Emitted when the engine fans a trigger out to its handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchEvent {
    /// Host time of the dispatch.
    pub timestamp: HostTime,
    /// Source of the notification.
    pub trigger: Trigger,
    /// Number of handlers in the snapshot.
    pub handler_count: usize,
}

/// What the rate limiter did with one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThrottleDecision {
    /// Invoked immediately.
    Leading,
    /// Latched the arguments and scheduled a trailing invocation.
    Scheduled(Duration),
    /// Latched the arguments; a trailing invocation was already pending.
    Coalesced,
    /// The deferred invocation ran.
    Trailing,
    /// A pending invocation was cancelled.
    Cancelled,
}

/// Emitted by throttled handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThrottleEvent {
    /// Host time of the decision.
    pub timestamp: HostTime,
    /// The decision.
    pub decision: ThrottleDecision,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called on an engine lifecycle transition.
    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        _ = e;
    }

    /// Called on every register/unregister call.
    fn on_registration(&mut self, e: &RegistrationEvent) {
        _ = e;
    }

    /// Called before handlers are notified.
    fn on_dispatch(&mut self, e: &DispatchEvent) {
        _ = e;
    }

    /// Called for every rate limiter decision.
    fn on_throttle(&mut self, e: &ThrottleEvent) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Shared slot
// ---------------------------------------------------------------------------

/// Optional sink shared between an engine and its throttles.
#[derive(Default)]
pub(crate) struct TraceSlot {
    sink: RefCell<Option<Box<dyn TraceSink>>>,
}

impl TraceSlot {
    pub(crate) fn replace(&self, sink: Option<Box<dyn TraceSink>>) -> Option<Box<dyn TraceSink>> {
        self.sink.replace(sink)
    }

    /// Calls `emit` with the installed sink, if any.
    ///
    /// A sink that re-enters the engine while handling an event is skipped
    /// for the nested events.
    #[inline]
    pub(crate) fn emit(&self, emit: impl FnOnce(&mut dyn TraceSink)) {
        #[cfg(feature = "trace")]
        if let Ok(mut slot) = self.sink.try_borrow_mut()
            && let Some(sink) = slot.as_deref_mut()
        {
            emit(sink);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = emit;
        }
    }
}

impl core::fmt::Debug for TraceSlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let installed = self.sink.try_borrow().map(|s| s.is_some()).unwrap_or(true);
        f.debug_struct("TraceSlot")
            .field("installed", &installed)
            .finish_non_exhaustive()
    }
}
