// Copyright 2026 the Relayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM-backed [`Host`].
//!
//! [`WebHost`] owns every JS closure it registers so the listeners can be
//! removed again with the identical function reference. Dropping the host
//! detaches everything.

use std::fmt;

use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, Event, HtmlElement, MutationObserver, MutationObserverInit, Window,
};

use relayout_core::catalog::EventType;
use relayout_core::host::{Host, Notifier, ReadyState, ResourceKind};

type EventClosure = Closure<dyn FnMut(Event)>;
type MutationClosure = Closure<dyn FnMut(js_sys::Array, MutationObserver)>;

struct MutationWatch {
    observer: MutationObserver,
    _callback: MutationClosure,
}

struct LoadWatch {
    root: HtmlElement,
    callback: EventClosure,
}

/// The page's `window` and `document`.
pub struct WebHost {
    window: Window,
    document: Document,
    mutations: Option<MutationWatch>,
    window_listeners: Vec<(EventType, EventClosure)>,
    load: Option<LoadWatch>,
    ready: Option<EventClosure>,
}

impl WebHost {
    /// Binds to the global `window` and its `document`.
    ///
    /// # Errors
    ///
    /// Fails outside a browser main thread, where there is no global window
    /// or document.
    pub fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("window has no document"))?;
        Ok(Self::with_window(window, document))
    }

    /// Binds to an explicit window/document pair (e.g. a same-origin iframe).
    #[must_use]
    pub fn with_window(window: Window, document: Document) -> Self {
        Self {
            window,
            document,
            mutations: None,
            window_listeners: Vec::new(),
            load: None,
            ready: None,
        }
    }
}

fn event_closure(f: impl FnMut(Event) + 'static) -> EventClosure {
    Closure::wrap(Box::new(f) as Box<dyn FnMut(Event)>)
}

/// Classifies the target of a `load` event.
fn load_target_kind(event: &Event) -> ResourceKind {
    event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok())
        .map_or(ResourceKind::Other, |el| {
            ResourceKind::from_tag_name(&el.tag_name())
        })
}

impl Host for WebHost {
    fn ready_state(&self) -> ReadyState {
        ReadyState::parse(&self.document.ready_state())
    }

    fn observe_mutations(&mut self, notifier: Notifier) {
        self.disconnect_mutations();
        let Some(body) = self.document.body() else {
            return;
        };

        let callback: MutationClosure = Closure::wrap(Box::new(
            move |_records: js_sys::Array, _observer: MutationObserver| notifier.mutations(),
        )
            as Box<dyn FnMut(js_sys::Array, MutationObserver)>);
        let Ok(observer) = MutationObserver::new(callback.as_ref().unchecked_ref()) else {
            return;
        };

        let init = MutationObserverInit::new();
        init.set_attributes(true);
        init.set_attribute_old_value(false);
        init.set_character_data(true);
        init.set_character_data_old_value(false);
        init.set_child_list(true);
        init.set_subtree(true);
        let _ = observer.observe_with_options(&body, &init);

        self.mutations = Some(MutationWatch {
            observer,
            _callback: callback,
        });
    }

    fn disconnect_mutations(&mut self) {
        if let Some(watch) = self.mutations.take() {
            watch.observer.disconnect();
        }
    }

    fn add_window_listener(&mut self, event: EventType, notifier: Notifier) {
        if self.window_listeners.iter().any(|(e, _)| *e == event) {
            return;
        }
        let callback = event_closure(move |_e: Event| notifier.window_event(event));
        let _ = self
            .window
            .add_event_listener_with_callback(event.name(), callback.as_ref().unchecked_ref());
        self.window_listeners.push((event, callback));
    }

    fn remove_window_listener(&mut self, event: EventType) {
        let Some(idx) = self.window_listeners.iter().position(|(e, _)| *e == event) else {
            return;
        };
        let (_, callback) = self.window_listeners.swap_remove(idx);
        let _ = self
            .window
            .remove_event_listener_with_callback(event.name(), callback.as_ref().unchecked_ref());
    }

    fn add_load_listener(&mut self, notifier: Notifier) {
        self.remove_load_listener();
        let Some(root) = self.document.body() else {
            return;
        };
        let callback = event_closure(move |e: Event| notifier.resource_loaded(load_target_kind(&e)));
        // Resource load events don't bubble and never reach the window, so
        // listen in the capture phase on the root container.
        let _ = root.add_event_listener_with_callback_and_bool(
            "load",
            callback.as_ref().unchecked_ref(),
            true,
        );
        self.load = Some(LoadWatch { root, callback });
    }

    fn remove_load_listener(&mut self) {
        // Nothing was attached if the root container never existed.
        if let Some(watch) = self.load.take() {
            let _ = watch.root.remove_event_listener_with_callback_and_bool(
                "load",
                watch.callback.as_ref().unchecked_ref(),
                true,
            );
        }
    }

    fn add_ready_listener(&mut self, notifier: Notifier) {
        self.remove_ready_listener();
        let callback = event_closure(move |_e: Event| notifier.content_loaded());
        let _ = self.document.add_event_listener_with_callback(
            "DOMContentLoaded",
            callback.as_ref().unchecked_ref(),
        );
        self.ready = Some(callback);
    }

    fn remove_ready_listener(&mut self) {
        if let Some(callback) = self.ready.take() {
            let _ = self.document.remove_event_listener_with_callback(
                "DOMContentLoaded",
                callback.as_ref().unchecked_ref(),
            );
        }
    }
}

impl Drop for WebHost {
    fn drop(&mut self) {
        self.disconnect_mutations();
        for event in EventType::all() {
            self.remove_window_listener(event);
        }
        self.remove_load_listener();
        self.remove_ready_listener();
    }
}

impl fmt::Debug for WebHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebHost")
            .field("document", &"Document")
            .field("observing_mutations", &self.mutations.is_some())
            .field("window_listeners", &self.window_listeners.len())
            .field("load_listener", &self.load.is_some())
            .field("ready_listener", &self.ready.is_some())
            .finish_non_exhaustive()
    }
}
