// Copyright 2026 the Relayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for platform integrations.
//!
//! The engine never touches a DOM directly. Everything it needs from the
//! surrounding page is expressed by two traits:
//!
//! - [`Host`] — document readiness plus attach/detach operations for the
//!   mutation observer, the window event listeners, the root-container load
//!   listener, and the one-shot content-loaded listener.
//! - [`Timers`] — a clock and a deferred-execution primitive, used by the
//!   [`Throttle`](crate::throttle::Throttle) rate limiter.
//!
//! Host callbacks route back into the engine through a [`Notifier`], a weak
//! handle that becomes inert once the engine is dropped.
//!
//! # Re-entrancy
//!
//! The engine holds a mutable borrow of the host while calling any `add_*`,
//! `remove_*`, `observe_*` or `disconnect_*` method. Implementations must not
//! invoke a [`Notifier`] synchronously from inside those methods; browser
//! `addEventListener` and `MutationObserver.observe` never do.

use alloc::boxed::Box;
use alloc::rc::Weak;
use core::fmt;

use crate::catalog::EventType;
use crate::time::{Duration, HostTime};

/// Document loading stage, mirroring `document.readyState`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReadyState {
    /// The document is still being parsed.
    Loading,
    /// Parsing finished; the root content container is reachable.
    Interactive,
    /// The document and its sub-resources have loaded.
    Complete,
}

impl ReadyState {
    /// Parses a `document.readyState` string.
    ///
    /// Unknown values map to [`Loading`](Self::Loading), which keeps the
    /// engine waiting for the content-loaded transition.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "interactive" => Self::Interactive,
            "complete" => Self::Complete,
            _ => Self::Loading,
        }
    }

    /// Returns `true` once the document is interactive or complete.
    #[must_use]
    pub const fn is_content_loaded(self) -> bool {
        matches!(self, Self::Interactive | Self::Complete)
    }
}

/// Classification of an element whose load completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// An `<img>` element.
    Image,
    /// Any other embedded resource (scripts, iframes, stylesheets, ...).
    Other,
}

impl ResourceKind {
    /// Classifies a load target by its tag name (case-insensitive).
    #[must_use]
    pub fn from_tag_name(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("img") {
            Self::Image
        } else {
            Self::Other
        }
    }
}

/// Why handlers are being notified.
///
/// This labels the source of a notification. It carries no information about
/// what changed in the layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// A batch of DOM mutations under the root content container.
    Mutation,
    /// One of the catalog window events fired.
    Event(EventType),
    /// An image finished loading.
    ResourceLoaded,
    /// The document reached interactive readiness after observation began.
    ContentLoaded,
}

/// What a host observed, as reported through a [`Notifier`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Signal {
    Mutations,
    WindowEvent(EventType),
    ResourceLoaded(ResourceKind),
    ContentLoaded,
}

/// Receiving end of a [`Notifier`].
pub(crate) trait Dispatch {
    fn dispatch(&self, signal: Signal);
}

/// Weak route from host callbacks back into the engine.
///
/// Cloning is cheap. Every method is a no-op once the engine is gone.
#[derive(Clone)]
pub struct Notifier {
    route: Weak<dyn Dispatch>,
}

impl Notifier {
    pub(crate) fn new(route: Weak<dyn Dispatch>) -> Self {
        Self { route }
    }

    fn send(&self, signal: Signal) {
        if let Some(target) = self.route.upgrade() {
            target.dispatch(signal);
        }
    }

    /// Reports one batch of mutation records.
    pub fn mutations(&self) {
        self.send(Signal::Mutations);
    }

    /// Reports a catalog event on the window.
    pub fn window_event(&self, event: EventType) {
        self.send(Signal::WindowEvent(event));
    }

    /// Reports a capture-phase load event under the root container.
    pub fn resource_loaded(&self, kind: ResourceKind) {
        self.send(Signal::ResourceLoaded(kind));
    }

    /// Reports the document's content-loaded transition.
    pub fn content_loaded(&self) {
        self.send(Signal::ContentLoaded);
    }

    /// Returns `true` while the engine behind this notifier is alive.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.route.strong_count() > 0
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

/// The document and window the engine observes.
///
/// All operations are infallible from the engine's point of view. Removal
/// methods must be no-ops when nothing is attached, and
/// [`remove_load_listener`](Self::remove_load_listener) must tolerate the root
/// content container not existing yet.
pub trait Host {
    /// Current document readiness.
    fn ready_state(&self) -> ReadyState;

    /// Observes attribute, character-data and child-list changes over the
    /// whole subtree of the root content container. Old values are not
    /// needed. `notifier` is called once per batch of records.
    fn observe_mutations(&mut self, notifier: Notifier);

    /// Stops the mutation observer.
    fn disconnect_mutations(&mut self);

    /// Adds a bubbling-phase window listener for `event`.
    fn add_window_listener(&mut self, event: EventType, notifier: Notifier);

    /// Removes the window listener for `event`.
    fn remove_window_listener(&mut self, event: EventType);

    /// Adds a capture-phase `load` listener on the root content container.
    ///
    /// Load events of nested resources neither bubble nor reach the window,
    /// so capture at the root container is the only place to see them.
    fn add_load_listener(&mut self, notifier: Notifier);

    /// Removes the root-container `load` listener.
    fn remove_load_listener(&mut self);

    /// Adds a one-shot listener for the document's content-loaded transition.
    fn add_ready_listener(&mut self, notifier: Notifier);

    /// Removes the content-loaded listener if it is still attached.
    fn remove_ready_listener(&mut self);
}

/// Opaque identifier of a scheduled timeout.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeoutId(pub u32);

impl fmt::Debug for TimeoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeoutId({})", self.0)
    }
}

/// Clock and deferred execution.
pub trait Timers {
    /// Reads the host clock.
    ///
    /// Not assumed to be monotonic.
    fn now(&self) -> HostTime;

    /// Runs `callback` once after `delay`.
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimeoutId;

    /// Cancels a scheduled timeout. Unknown or already-fired ids are ignored.
    fn clear_timeout(&self, id: TimeoutId);
}
