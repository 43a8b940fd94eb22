// Copyright 2026 the Relayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory document and window.
//!
//! [`SimDocument`] models just enough of a page to exercise the engine:
//! readiness, whether the root content container exists yet, the listeners
//! the engine attached, and a mutation record queue that is delivered as one
//! batch per [`flush_microtasks`](SimDocument::flush_microtasks), the way a
//! browser delivers mutation records asynchronously.
//!
//! [`SimHost`] is the [`Host`] half handed to the engine; tests keep a
//! [`SimDocument`] clone to drive the page.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use relayout_core::catalog::EventType;
use relayout_core::host::{Host, Notifier, ReadyState, ResourceKind};

/// One queued mutation record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// A node was added or removed.
    ChildList,
    /// An attribute was set or removed.
    Attributes,
    /// Text content changed.
    CharacterData,
}

#[derive(Debug)]
struct Page {
    ready: ReadyState,
    observer: Option<Notifier>,
    records: Vec<MutationKind>,
    window: Vec<(EventType, Notifier)>,
    load: Option<Notifier>,
    ready_listener: Option<Notifier>,
    body_children: usize,
}

impl Page {
    fn has_body(&self) -> bool {
        self.ready.is_content_loaded()
    }
}

/// Shared handle to a simulated page.
#[derive(Clone, Debug)]
pub struct SimDocument {
    page: Rc<RefCell<Page>>,
}

impl SimDocument {
    /// Creates a page at the given readiness.
    #[must_use]
    pub fn new(ready: ReadyState) -> Self {
        Self {
            page: Rc::new(RefCell::new(Page {
                ready,
                observer: None,
                records: Vec::new(),
                window: Vec::new(),
                load: None,
                ready_listener: None,
                body_children: 0,
            })),
        }
    }

    /// Returns the [`Host`] view of this page for an engine.
    #[must_use]
    pub fn host(&self) -> SimHost {
        SimHost { doc: self.clone() }
    }

    /// Current readiness.
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.page.borrow().ready
    }

    /// Moves the page to `ready`.
    ///
    /// Leaving [`Loading`](ReadyState::Loading) creates the root container and
    /// fires the content-loaded listener once, after which it is detached.
    pub fn set_ready_state(&self, ready: ReadyState) {
        let fire = {
            let mut page = self.page.borrow_mut();
            let was_loaded = page.ready.is_content_loaded();
            page.ready = ready;
            if !was_loaded && ready.is_content_loaded() {
                page.ready_listener.take()
            } else {
                None
            }
        };
        if let Some(notifier) = fire {
            notifier.content_loaded();
        }
    }

    /// Appends a child to the root container.
    pub fn append_child(&self) {
        let mut page = self.page.borrow_mut();
        page.body_children += 1;
        Self::record(&mut page, MutationKind::ChildList);
    }

    /// Sets an attribute on the root container.
    pub fn set_attribute(&self) {
        Self::record(&mut self.page.borrow_mut(), MutationKind::Attributes);
    }

    /// Changes text inside the root container.
    pub fn set_character_data(&self) {
        Self::record(&mut self.page.borrow_mut(), MutationKind::CharacterData);
    }

    fn record(page: &mut Page, kind: MutationKind) {
        if page.observer.is_some() {
            page.records.push(kind);
        }
    }

    /// Delivers queued mutation records as one batch. Returns the batch size.
    pub fn flush_microtasks(&self) -> usize {
        let (notifier, batch) = {
            let mut page = self.page.borrow_mut();
            let batch = core::mem::take(&mut page.records);
            (page.observer.clone(), batch.len())
        };
        if batch > 0
            && let Some(notifier) = notifier
        {
            notifier.mutations();
        }
        batch
    }

    /// Number of mutation records waiting for the next flush.
    #[must_use]
    pub fn queued_records(&self) -> usize {
        self.page.borrow().records.len()
    }

    /// Dispatches a bubbling event named `name` at the window.
    ///
    /// Returns `true` if a listener received it.
    pub fn dispatch_window_event(&self, name: &str) -> bool {
        let notifier = {
            let page = self.page.borrow();
            page.window
                .iter()
                .find(|(event, _)| event.name() == name)
                .map(|(event, n)| (*event, n.clone()))
        };
        match notifier {
            Some((event, n)) => {
                n.window_event(event);
                true
            }
            None => false,
        }
    }

    /// Finishes loading an element with tag `tag` inside the root container.
    ///
    /// Returns `true` if the capture listener saw it.
    pub fn finish_load(&self, tag: &str) -> bool {
        let notifier = self.page.borrow().load.clone();
        match notifier {
            Some(n) => {
                n.resource_loaded(ResourceKind::from_tag_name(tag));
                true
            }
            None => false,
        }
    }

    /// Number of children appended to the root container.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.page.borrow().body_children
    }

    /// Number of window listeners currently attached.
    #[must_use]
    pub fn window_listener_count(&self) -> usize {
        self.page.borrow().window.len()
    }

    /// Returns `true` while a mutation observer is attached.
    #[must_use]
    pub fn has_mutation_observer(&self) -> bool {
        self.page.borrow().observer.is_some()
    }

    /// Returns `true` while the root container has a load listener.
    #[must_use]
    pub fn has_load_listener(&self) -> bool {
        self.page.borrow().load.is_some()
    }

    /// Returns `true` while a content-loaded listener is attached.
    #[must_use]
    pub fn has_ready_listener(&self) -> bool {
        self.page.borrow().ready_listener.is_some()
    }

    /// Returns `true` when nothing at all is attached.
    #[must_use]
    pub fn is_quiescent(&self) -> bool {
        let page = self.page.borrow();
        page.observer.is_none()
            && page.window.is_empty()
            && page.load.is_none()
            && page.ready_listener.is_none()
    }
}

/// The engine-facing side of a [`SimDocument`].
#[derive(Clone, Debug)]
pub struct SimHost {
    doc: SimDocument,
}

impl Host for SimHost {
    fn ready_state(&self) -> ReadyState {
        self.doc.ready_state()
    }

    fn observe_mutations(&mut self, notifier: Notifier) {
        let mut page = self.doc.page.borrow_mut();
        debug_assert!(page.has_body(), "observing before the root container exists");
        page.observer = Some(notifier);
    }

    fn disconnect_mutations(&mut self) {
        let mut page = self.doc.page.borrow_mut();
        page.observer = None;
        page.records.clear();
    }

    fn add_window_listener(&mut self, event: EventType, notifier: Notifier) {
        let mut page = self.doc.page.borrow_mut();
        // addEventListener ignores an identical (type, listener) pair.
        if !page.window.iter().any(|(e, _)| *e == event) {
            page.window.push((event, notifier));
        }
    }

    fn remove_window_listener(&mut self, event: EventType) {
        self.doc.page.borrow_mut().window.retain(|(e, _)| *e != event);
    }

    fn add_load_listener(&mut self, notifier: Notifier) {
        let mut page = self.doc.page.borrow_mut();
        if page.has_body() {
            page.load = Some(notifier);
        }
    }

    fn remove_load_listener(&mut self) {
        let mut page = self.doc.page.borrow_mut();
        // No root container yet: nothing could have been attached.
        if page.has_body() {
            page.load = None;
        }
    }

    fn add_ready_listener(&mut self, notifier: Notifier) {
        self.doc.page.borrow_mut().ready_listener = Some(notifier);
    }

    fn remove_ready_listener(&mut self) {
        self.doc.page.borrow_mut().ready_listener = None;
    }
}
