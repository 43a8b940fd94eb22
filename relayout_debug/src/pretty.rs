// Copyright 2026 the Relayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in milliseconds.

use std::io::Write;

use relayout_core::engine::Lifecycle;
use relayout_core::host::Trigger;
use relayout_core::time::HostTime;
use relayout_core::trace::{
    DispatchEvent, LifecycleEvent, RegistrationEvent, RegistrationKind, ThrottleDecision,
    ThrottleEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the destination.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn ms(t: HostTime) -> f64 {
    t.ticks() as f64 / 1000.0
}

pub(crate) fn lifecycle_name(l: Lifecycle) -> &'static str {
    match l {
        Lifecycle::Idle => "idle",
        Lifecycle::AwaitingReady => "awaiting-ready",
        Lifecycle::Observing { .. } => "observing",
    }
}

pub(crate) fn trigger_name(t: Trigger) -> &'static str {
    match t {
        Trigger::Mutation => "mutation",
        Trigger::Event(event) => event.name(),
        Trigger::ResourceLoaded => "image-load",
        Trigger::ContentLoaded => "content-loaded",
    }
}

pub(crate) fn registration_name(k: RegistrationKind) -> &'static str {
    match k {
        RegistrationKind::Added => "added",
        RegistrationKind::Duplicate => "duplicate",
        RegistrationKind::Removed => "removed",
        RegistrationKind::Unknown => "unknown",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        let _ = writeln!(
            self.writer,
            "[lifecycle] {} -> {} at {:.3}ms",
            lifecycle_name(e.from),
            lifecycle_name(e.to),
            ms(e.timestamp),
        );
    }

    fn on_registration(&mut self, e: &RegistrationEvent) {
        let _ = writeln!(
            self.writer,
            "[register] {} handlers={} at {:.3}ms",
            registration_name(e.kind),
            e.handler_count,
            ms(e.timestamp),
        );
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        let _ = writeln!(
            self.writer,
            "[dispatch] {} handlers={} at {:.3}ms",
            trigger_name(e.trigger),
            e.handler_count,
            ms(e.timestamp),
        );
    }

    fn on_throttle(&mut self, e: &ThrottleEvent) {
        let _ = match e.decision {
            ThrottleDecision::Scheduled(delay) => writeln!(
                self.writer,
                "[throttle] scheduled in {}ms at {:.3}ms",
                delay.as_millis(),
                ms(e.timestamp),
            ),
            decision => writeln!(
                self.writer,
                "[throttle] {} at {:.3}ms",
                decision_name(decision),
                ms(e.timestamp),
            ),
        };
    }
}

pub(crate) fn decision_name(d: ThrottleDecision) -> &'static str {
    match d {
        ThrottleDecision::Leading => "leading",
        ThrottleDecision::Scheduled(_) => "scheduled",
        ThrottleDecision::Coalesced => "coalesced",
        ThrottleDecision::Trailing => "trailing",
        ThrottleDecision::Cancelled => "cancelled",
    }
}
