// Copyright 2026 the Relayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shared detection engine.
//!
//! One [`Engine`] multiplexes three signal sources onto every registered
//! [`Handler`]:
//!
//! - DOM subtree mutations under the root content container,
//! - the window events in [`EVENT_TYPES`](crate::catalog::EVENT_TYPES),
//! - load completion of images under the root content container.
//!
//! However many handlers are registered, the engine attaches exactly one
//! mutation observer and one listener per catalog event. Watchers are attached
//! when the registration set goes from empty to non-empty and detached when it
//! becomes empty again.
//!
//! # Lifecycle
//!
//! ```text
//!                 register (document loading)
//!     Idle ───────────────────────────────────► AwaitingReady
//!      │ ▲                                          │
//!      │ │ last unregister              content loaded: attach + notify once
//!      │ │                                          ▼
//!      │ └──────────────────────────────────── Observing
//!      │                                            ▲
//!      └────────────────────────────────────────────┘
//!           register (document interactive or complete): attach only
//! ```
//!
//! Signals that arrive while not [`Observing`](Lifecycle::Observing) are
//! dropped, so no handler runs before the document is ready.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::catalog::EventType;
use crate::host::{Dispatch, Host, Notifier, ResourceKind, Signal, Timers, Trigger};
use crate::trace::{
    DispatchEvent, LifecycleEvent, RegistrationEvent, RegistrationKind, TraceSink, TraceSlot,
};

/// Something to call when layout may have changed.
pub trait Handler {
    /// Called once per detected signal.
    fn on_layout_change(&self, trigger: Trigger);
}

impl<F: Fn(Trigger)> Handler for F {
    fn on_layout_change(&self, trigger: Trigger) {
        self(trigger);
    }
}

/// A registered handler. Identity is the allocation address.
pub type SharedHandler = Rc<dyn Handler>;

fn same_handler(a: &SharedHandler, b: &SharedHandler) -> bool {
    core::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Which watchers the engine currently has attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Nothing attached.
    Idle,
    /// Only the content-loaded listener is attached.
    AwaitingReady,
    /// Mutation observer, catalog listeners and load listener attached.
    Observing {
        /// The content-loaded listener is still attached (observation went
        /// through [`AwaitingReady`](Self::AwaitingReady)).
        ready_listener: bool,
    },
}

impl Lifecycle {
    /// Returns `true` unless [`Idle`](Self::Idle).
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Returns `true` when signals are delivered to handlers.
    #[must_use]
    pub const fn is_observing(self) -> bool {
        matches!(self, Self::Observing { .. })
    }
}

/// Shared handle to a detection engine.
///
/// Cloning is cheap and yields another handle to the same engine.
pub struct Engine<H: Host + 'static> {
    inner: Rc<Inner<H>>,
}

impl<H: Host + 'static> Clone for Engine<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

struct Inner<H: Host + 'static> {
    me: Weak<Self>,
    host: RefCell<H>,
    timers: Rc<dyn Timers>,
    lifecycle: Cell<Lifecycle>,
    handlers: RefCell<Vec<SharedHandler>>,
    trace: Rc<TraceSlot>,
}

impl<H: Host + 'static> Engine<H> {
    /// Creates an idle engine over `host`, reading time from `timers`.
    pub fn new(host: H, timers: Rc<dyn Timers>) -> Self {
        Self {
            inner: Rc::new_cyclic(|me| Inner {
                me: me.clone(),
                host: RefCell::new(host),
                timers,
                lifecycle: Cell::new(Lifecycle::Idle),
                handlers: RefCell::new(Vec::new()),
                trace: Rc::new(TraceSlot::default()),
            }),
        }
    }

    /// Adds `handler` to the registration set and makes sure observation is
    /// active. Registering a handler twice is a no-op.
    pub fn register(&self, handler: SharedHandler) {
        self.inner.register(handler);
    }

    /// Removes `handler`; stops observation when it was the last one.
    /// Unknown handlers are ignored.
    pub fn unregister(&self, handler: &SharedHandler) {
        self.inner.unregister(handler);
    }

    /// Returns `true` if `handler` is in the registration set.
    #[must_use]
    pub fn is_registered(&self, handler: &SharedHandler) -> bool {
        self.inner
            .handlers
            .borrow()
            .iter()
            .any(|h| same_handler(h, handler))
    }

    /// Size of the registration set.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.borrow().len()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.lifecycle.get()
    }

    /// Returns `true` while any watcher is attached.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.lifecycle().is_active()
    }

    /// The engine's clock and timer source.
    #[must_use]
    pub fn timers(&self) -> Rc<dyn Timers> {
        Rc::clone(&self.inner.timers)
    }

    /// Installs (or, with `None`, removes) the trace sink, returning the
    /// previous one.
    pub fn set_trace_sink(&self, sink: Option<Box<dyn TraceSink>>) -> Option<Box<dyn TraceSink>> {
        self.inner.trace.replace(sink)
    }

    pub(crate) fn trace_slot(&self) -> Rc<TraceSlot> {
        Rc::clone(&self.inner.trace)
    }
}

impl<H: Host + 'static> Inner<H> {
    fn notifier(&self) -> Notifier {
        let route: Weak<dyn Dispatch> = self.me.clone();
        Notifier::new(route)
    }

    fn register(&self, handler: SharedHandler) {
        let kind = {
            let mut handlers = self.handlers.borrow_mut();
            if handlers.iter().any(|h| same_handler(h, &handler)) {
                RegistrationKind::Duplicate
            } else {
                handlers.push(handler);
                RegistrationKind::Added
            }
        };
        self.trace_registration(kind);

        if !self.lifecycle.get().is_active() {
            self.start();
        }
    }

    fn unregister(&self, handler: &SharedHandler) {
        let (kind, now_empty) = {
            let mut handlers = self.handlers.borrow_mut();
            match handlers.iter().position(|h| same_handler(h, handler)) {
                Some(idx) => {
                    handlers.remove(idx);
                    (RegistrationKind::Removed, handlers.is_empty())
                }
                None => (RegistrationKind::Unknown, false),
            }
        };
        self.trace_registration(kind);

        if now_empty {
            self.stop();
        }
    }

    fn start(&self) {
        let ready = self.host.borrow().ready_state().is_content_loaded();
        if ready {
            self.attach_watchers();
            self.transition(Lifecycle::Observing {
                ready_listener: false,
            });
        } else {
            // The root container may not exist yet; wait for it.
            self.host.borrow_mut().add_ready_listener(self.notifier());
            self.transition(Lifecycle::AwaitingReady);
        }
    }

    fn attach_watchers(&self) {
        let notifier = self.notifier();
        let mut host = self.host.borrow_mut();
        host.observe_mutations(notifier.clone());
        for event in EventType::all() {
            host.add_window_listener(event, notifier.clone());
        }
        host.add_load_listener(notifier);
    }

    fn stop(&self) {
        let lifecycle = self.lifecycle.get();
        {
            let mut host = self.host.borrow_mut();
            match lifecycle {
                Lifecycle::Idle => return,
                Lifecycle::AwaitingReady => host.remove_ready_listener(),
                Lifecycle::Observing { ready_listener } => {
                    host.disconnect_mutations();
                    if ready_listener {
                        host.remove_ready_listener();
                    }
                    for event in EventType::all() {
                        host.remove_window_listener(event);
                    }
                    host.remove_load_listener();
                }
            }
        }
        self.transition(Lifecycle::Idle);
    }

    fn transition(&self, to: Lifecycle) {
        let from = self.lifecycle.replace(to);
        self.trace.emit(|sink| {
            sink.on_lifecycle(&LifecycleEvent {
                timestamp: self.timers.now(),
                from,
                to,
            });
        });
    }

    fn trace_registration(&self, kind: RegistrationKind) {
        self.trace.emit(|sink| {
            sink.on_registration(&RegistrationEvent {
                timestamp: self.timers.now(),
                kind,
                handler_count: self.handlers.borrow().len(),
            });
        });
    }

    /// Notifies every handler registered at the time of the call.
    ///
    /// No interior borrow is held while a handler runs, so handlers may
    /// register or unregister freely. A handler unregistered by an earlier
    /// handler in the same round is skipped.
    fn notify_all(&self, trigger: Trigger) {
        let snapshot: Vec<SharedHandler> = self.handlers.borrow().clone();
        self.trace.emit(|sink| {
            sink.on_dispatch(&DispatchEvent {
                timestamp: self.timers.now(),
                trigger,
                handler_count: snapshot.len(),
            });
        });

        for handler in &snapshot {
            let still_registered = self
                .handlers
                .borrow()
                .iter()
                .any(|h| same_handler(h, handler));
            if still_registered {
                handler.on_layout_change(trigger);
            }
        }
    }
}

impl<H: Host + 'static> Dispatch for Inner<H> {
    fn dispatch(&self, signal: Signal) {
        match (self.lifecycle.get(), signal) {
            (Lifecycle::AwaitingReady, Signal::ContentLoaded) => {
                self.attach_watchers();
                self.transition(Lifecycle::Observing {
                    ready_listener: true,
                });
                self.notify_all(Trigger::ContentLoaded);
            }
            (Lifecycle::Observing { .. }, Signal::Mutations) => {
                self.notify_all(Trigger::Mutation);
            }
            (Lifecycle::Observing { .. }, Signal::WindowEvent(event)) => {
                self.notify_all(Trigger::Event(event));
            }
            (Lifecycle::Observing { .. }, Signal::ResourceLoaded(ResourceKind::Image)) => {
                self.notify_all(Trigger::ResourceLoaded);
            }
            // Non-image loads, stale listeners, repeated ready transitions.
            _ => {}
        }
    }
}

impl<H: Host + 'static> fmt::Debug for Engine<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("lifecycle", &self.inner.lifecycle.get())
            .field("handlers", &self.inner.handlers.borrow().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ReadyState;
    use crate::testing::{RecordingHost, StepTimers};
    use alloc::string::String;
    use alloc::vec;

    type Fixture = (
        Engine<RecordingHost>,
        Rc<RefCell<Vec<String>>>,
        Rc<RefCell<Option<Notifier>>>,
    );

    fn engine(ready: ReadyState) -> Fixture {
        let host = RecordingHost::new(ready);
        let log = host.log.clone();
        let notifier = host.notifier.clone();
        (Engine::new(host, Rc::new(StepTimers::default())), log, notifier)
    }

    fn counter() -> (SharedHandler, Rc<Cell<u32>>) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let handler: SharedHandler = Rc::new(move |_t: Trigger| c.set(c.get() + 1));
        (handler, count)
    }

    fn count_of(log: &[String], entry: &str) -> usize {
        log.iter().filter(|e| *e == entry).count()
    }

    #[test]
    fn ready_document_attaches_without_notifying() {
        let (engine, log, _) = engine(ReadyState::Complete);
        let (handler, count) = counter();
        engine.register(handler);

        assert_eq!(
            engine.lifecycle(),
            Lifecycle::Observing {
                ready_listener: false
            }
        );
        let log = log.borrow();
        assert_eq!(count_of(&log, "observe"), 1);
        assert_eq!(count_of(&log, "+window"), EventType::COUNT);
        assert_eq!(count_of(&log, "+load"), 1);
        assert_eq!(count_of(&log, "+ready"), 0);
        assert_eq!(count.get(), 0, "no notification on the immediate path");
    }

    #[test]
    fn loading_document_defers_until_content_loaded() {
        let (engine, log, notifier) = engine(ReadyState::Loading);
        let (handler, count) = counter();
        engine.register(handler);
        assert_eq!(engine.lifecycle(), Lifecycle::AwaitingReady);
        assert_eq!(*log.borrow(), vec![String::from("+ready")]);

        let notifier = notifier.borrow().clone().expect("ready listener attached");
        notifier.mutations();
        assert_eq!(count.get(), 0, "signals before readiness are dropped");

        notifier.content_loaded();
        assert_eq!(count.get(), 1, "exactly one notification at readiness");
        assert_eq!(
            engine.lifecycle(),
            Lifecycle::Observing {
                ready_listener: true
            }
        );

        notifier.content_loaded();
        assert_eq!(count.get(), 1, "readiness fires once");
    }

    #[test]
    fn watchers_are_shared_between_handlers() {
        let (engine, log, _) = engine(ReadyState::Interactive);
        let (a, _) = counter();
        let (b, _) = counter();
        engine.register(a.clone());
        engine.register(b.clone());
        engine.register(a.clone());
        assert_eq!(engine.handler_count(), 2, "duplicate registration ignored");
        assert_eq!(count_of(&log.borrow(), "observe"), 1);

        engine.unregister(&a);
        assert!(engine.is_observing());
        engine.unregister(&a);
        assert!(engine.is_observing(), "unknown handler is a no-op");
        engine.unregister(&b);
        assert_eq!(engine.lifecycle(), Lifecycle::Idle);

        let log = log.borrow();
        assert_eq!(count_of(&log, "disconnect"), 1);
        assert_eq!(count_of(&log, "-window"), EventType::COUNT);
        assert_eq!(count_of(&log, "-load"), 1);
    }

    #[test]
    fn stop_before_ready_only_removes_ready_listener() {
        let (engine, log, _) = engine(ReadyState::Loading);
        let (handler, _) = counter();
        engine.register(handler.clone());
        engine.unregister(&handler);
        assert_eq!(
            *log.borrow(),
            vec![String::from("+ready"), String::from("-ready")]
        );
        assert_eq!(engine.lifecycle(), Lifecycle::Idle);
    }

    #[test]
    fn deferred_stop_removes_ready_listener_too() {
        let (engine, log, notifier) = engine(ReadyState::Loading);
        let (handler, _) = counter();
        engine.register(handler.clone());
        let notifier = notifier.borrow().clone().expect("attached");
        notifier.content_loaded();
        engine.unregister(&handler);
        assert_eq!(count_of(&log.borrow(), "-ready"), 1);
        assert_eq!(count_of(&log.borrow(), "-load"), 1);
    }

    #[test]
    fn non_image_loads_are_ignored() {
        let (engine, _, notifier) = engine(ReadyState::Complete);
        let (handler, count) = counter();
        engine.register(handler);
        let notifier = notifier.borrow().clone().expect("observer attached");

        notifier.resource_loaded(ResourceKind::Other);
        assert_eq!(count.get(), 0);
        notifier.resource_loaded(ResourceKind::Image);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn handler_may_unregister_itself_during_dispatch() {
        let (engine, _, notifier) = engine(ReadyState::Complete);
        let calls = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<SharedHandler>>> = Rc::new(RefCell::new(None));

        let handler: SharedHandler = {
            let engine = engine.clone();
            let calls = calls.clone();
            let slot = slot.clone();
            Rc::new(move |_t: Trigger| {
                calls.set(calls.get() + 1);
                if let Some(me) = slot.borrow().as_ref() {
                    engine.unregister(me);
                }
            })
        };
        *slot.borrow_mut() = Some(handler.clone());
        engine.register(handler);

        let notifier = notifier.borrow().clone().expect("observer attached");
        notifier.mutations();
        notifier.mutations();
        assert_eq!(calls.get(), 1);
        assert_eq!(engine.lifecycle(), Lifecycle::Idle);
        // Break the handler -> slot -> handler cycle.
        slot.borrow_mut().take();
    }

    #[test]
    fn handler_removed_mid_round_is_skipped() {
        let (engine, _, notifier) = engine(ReadyState::Complete);
        let (victim, victim_count) = counter();
        let remover: SharedHandler = {
            let engine = engine.clone();
            let victim = victim.clone();
            Rc::new(move |_t: Trigger| engine.unregister(&victim))
        };
        engine.register(remover);
        engine.register(victim);

        let notifier = notifier.borrow().clone().expect("attached");
        notifier.mutations();
        assert_eq!(victim_count.get(), 0);
        assert_eq!(engine.handler_count(), 1);
    }

    #[test]
    fn dropped_engine_leaves_notifiers_inert() {
        let (engine, _, notifier) = engine(ReadyState::Complete);
        let (handler, count) = counter();
        engine.register(handler);
        let notifier = notifier.borrow().clone().expect("attached");
        drop(engine);
        notifier.mutations();
        assert_eq!(count.get(), 0);
        assert!(!notifier.is_connected());
    }
}
