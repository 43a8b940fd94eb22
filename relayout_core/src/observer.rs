// Copyright 2026 the Relayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Caller-facing listener handles.
//!
//! A [`LayoutObserver`] pairs one handler, optionally rate limited, with
//! [`observe`](LayoutObserver::observe) and
//! [`disconnect`](LayoutObserver::disconnect) against a shared [`Engine`].
//! Handles are independent: each can be activated and deactivated on its own
//! while the engine keeps exactly one set of watchers for all of them.

use alloc::rc::Rc;
use core::fmt;

use crate::engine::{Engine, Handler, SharedHandler};
use crate::host::{Host, Trigger};
use crate::throttle::Throttle;
use crate::time::Duration;

/// What happens to a throttled handler's pending trailing call when its
/// observer disconnects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PendingOnDisconnect {
    /// Let it fire. The handler may run once after disconnecting.
    #[default]
    Deliver,
    /// Cancel it.
    Cancel,
}

/// Options for [`LayoutObserver::with_options`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ObserverOptions {
    /// Minimum interval between handler calls. `None` or zero disables rate
    /// limiting.
    pub throttle: Option<Duration>,
    /// Policy for a trailing call still pending at disconnect.
    pub pending_on_disconnect: PendingOnDisconnect,
}

impl ObserverOptions {
    /// Rate limits the handler to one call per `ms` milliseconds.
    #[must_use]
    pub const fn throttle_ms(mut self, ms: u64) -> Self {
        self.throttle = Some(Duration::from_millis(ms));
        self
    }

    /// Sets the disconnect policy for pending trailing calls.
    #[must_use]
    pub const fn pending_on_disconnect(mut self, policy: PendingOnDisconnect) -> Self {
        self.pending_on_disconnect = policy;
        self
    }

    /// The effective throttle interval, treating zero as absent.
    #[must_use]
    pub fn effective_throttle(&self) -> Option<Duration> {
        self.throttle.filter(|wait| !wait.is_zero())
    }
}

/// A handler registration that can be switched on and off.
///
/// Dropping the observer disconnects it under its [`PendingOnDisconnect`] policy.
pub struct LayoutObserver<H: Host + 'static> {
    engine: Engine<H>,
    handler: SharedHandler,
    throttle: Option<Throttle<Trigger, ()>>,
    pending_on_disconnect: PendingOnDisconnect,
}

impl<H: Host + 'static> LayoutObserver<H> {
    /// Creates an inactive observer that calls `handler` on every signal.
    pub fn new(engine: &Engine<H>, handler: impl Handler + 'static) -> Self {
        Self::with_options(engine, handler, ObserverOptions::default())
    }

    /// Creates an inactive observer with the given options.
    pub fn with_options(
        engine: &Engine<H>,
        handler: impl Handler + 'static,
        options: ObserverOptions,
    ) -> Self {
        Self::from_shared(engine, Rc::new(handler), options)
    }

    /// Creates an inactive observer around an existing shared handler.
    ///
    /// Without throttling, observers built from the same `Rc` share one
    /// registration: the engine deduplicates by identity, so disconnecting
    /// either removes the handler for both.
    pub fn from_shared(
        engine: &Engine<H>,
        handler: SharedHandler,
        options: ObserverOptions,
    ) -> Self {
        let (handler, throttle) = match options.effective_throttle() {
            Some(wait) => {
                let inner = handler;
                let throttle = Throttle::with_trace(
                    move |trigger: Trigger| inner.on_layout_change(trigger),
                    wait,
                    engine.timers(),
                    engine.trace_slot(),
                );
                let shared: SharedHandler = Rc::new(throttle.clone());
                (shared, Some(throttle))
            }
            None => (handler, None),
        };
        Self {
            engine: engine.clone(),
            handler,
            throttle,
            pending_on_disconnect: options.pending_on_disconnect,
        }
    }

    /// Starts receiving notifications. Calling it again is a no-op.
    pub fn observe(&self) {
        self.engine.register(Rc::clone(&self.handler));
    }

    /// Stops receiving notifications. Calling it again is a no-op.
    pub fn disconnect(&self) {
        self.engine.unregister(&self.handler);
        if self.pending_on_disconnect == PendingOnDisconnect::Cancel
            && let Some(throttle) = &self.throttle
        {
            throttle.cancel();
        }
    }

    /// Returns `true` while this observer's handler is registered.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.engine.is_registered(&self.handler)
    }

    /// The engine this observer registers with.
    #[must_use]
    pub fn engine(&self) -> &Engine<H> {
        &self.engine
    }

    /// The rate limiter wrapping the handler, if any.
    #[must_use]
    pub fn throttle(&self) -> Option<&Throttle<Trigger, ()>> {
        self.throttle.as_ref()
    }
}

impl<H: Host + 'static> Drop for LayoutObserver<H> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl<H: Host + 'static> fmt::Debug for LayoutObserver<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutObserver")
            .field("observing", &self.is_observing())
            .field("throttle", &self.throttle)
            .field("pending_on_disconnect", &self.pending_on_disconnect)
            .finish_non_exhaustive()
    }
}
