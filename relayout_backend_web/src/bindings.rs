// Copyright 2026 the Relayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JavaScript-facing `LayoutObserver` class.
//!
//! ```js
//! const observer = new LayoutObserver(() => reposition(), { throttle: 100 });
//! observer.observe();
//! // ...
//! observer.disconnect();
//! ```
//!
//! Every instance registers with the per-thread [`shared_engine`].

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::{Function, Number, Object, Reflect};
use wasm_bindgen::prelude::*;

use relayout_core::engine::{Handler, SharedHandler};
use relayout_core::host::Trigger;
use relayout_core::observer::{LayoutObserver, ObserverOptions, PendingOnDisconnect};
use relayout_core::time::Duration;

use crate::{WebHost, shared_engine};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "reportError")]
    fn report_error(error: &JsValue);
}

thread_local! {
    static JS_HANDLERS: RefCell<SharedHandlers<Function>> =
        const { RefCell::new(SharedHandlers::new()) };
}

/// Hands out one shared handler per key, so observers built from the same
/// key share a single engine registration.
pub(crate) struct SharedHandlers<K> {
    entries: Vec<(K, Weak<dyn Handler>)>,
}

impl<K: Clone> SharedHandlers<K> {
    pub(crate) const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Returns the live handler for `key`, or builds one with `make`.
    pub(crate) fn get_or_insert(
        &mut self,
        key: K,
        same: impl Fn(&K, &K) -> bool,
        make: impl FnOnce(K) -> SharedHandler,
    ) -> SharedHandler {
        self.entries.retain(|(_, handler)| handler.strong_count() > 0);
        if let Some(handler) = self
            .entries
            .iter()
            .find(|(k, _)| same(k, &key))
            .and_then(|(_, handler)| handler.upgrade())
        {
            return handler;
        }
        let handler = make(key.clone());
        self.entries.push((key, Rc::downgrade(&handler)));
        handler
    }
}

/// Wraps a JS function as a handler called with no arguments.
///
/// Exceptions thrown by the function go to the global error handler.
fn js_handler(function: Function) -> SharedHandler {
    Rc::new(move |_trigger: Trigger| {
        if let Err(error) = function.call0(&JsValue::UNDEFINED) {
            report_error(&error);
        }
    })
}

/// Converts a JS `throttle` option (milliseconds) to an interval.
///
/// Anything not a finite positive number means "no throttling".
pub(crate) fn throttle_from_ms(ms: f64) -> Option<Duration> {
    if !ms.is_finite() || ms <= 0.0 {
        return None;
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "checked finite and positive; saturating float-to-int cast is intended"
    )]
    let us = (ms * 1000.0) as u64;
    Some(Duration(us))
}

/// Reads a `throttle` option value: falsy means absent, anything else is
/// coerced with `Number(value)`.
pub(crate) fn throttle_option(value: &JsValue) -> Option<Duration> {
    if !value.is_truthy() {
        return None;
    }
    throttle_from_ms(Number::new(value).value_of())
}

/// Parses the `pendingOnDisconnect` option.
pub(crate) fn pending_policy(value: Option<&str>) -> PendingOnDisconnect {
    match value {
        Some("cancel") => PendingOnDisconnect::Cancel,
        _ => PendingOnDisconnect::Deliver,
    }
}

fn read_options(options: Option<&Object>) -> ObserverOptions {
    let Some(options) = options else {
        return ObserverOptions::default();
    };
    let throttle = Reflect::get(options, &JsValue::from_str("throttle"))
        .ok()
        .and_then(|v| throttle_option(&v));
    let pending = Reflect::get(options, &JsValue::from_str("pendingOnDisconnect"))
        .ok()
        .and_then(|v| v.as_string());
    ObserverOptions {
        throttle,
        pending_on_disconnect: pending_policy(pending.as_deref()),
    }
}

/// `new LayoutObserver(handler, options?)`.
#[wasm_bindgen(js_name = LayoutObserver)]
pub struct JsLayoutObserver {
    inner: LayoutObserver<WebHost>,
}

#[wasm_bindgen(js_class = LayoutObserver)]
impl JsLayoutObserver {
    /// Creates an inactive observer calling `handler` with no arguments.
    ///
    /// Unthrottled observers built from the same function share one
    /// registration, so the function runs once per layout change.
    ///
    /// # Errors
    ///
    /// Throws when no document is available.
    #[wasm_bindgen(constructor)]
    pub fn new(handler: Function, options: Option<Object>) -> Result<Self, JsValue> {
        let engine = shared_engine()?;
        let options = read_options(options.as_ref());
        let handler = if options.effective_throttle().is_some() {
            js_handler(handler)
        } else {
            JS_HANDLERS.with(|handlers| {
                handlers
                    .borrow_mut()
                    .get_or_insert(handler, |a, b| Object::is(a, b), js_handler)
            })
        };
        Ok(Self {
            inner: LayoutObserver::from_shared(&engine, handler, options),
        })
    }

    /// Starts receiving notifications.
    pub fn observe(&self) {
        self.inner.observe();
    }

    /// Stops receiving notifications.
    pub fn disconnect(&self) {
        self.inner.disconnect();
    }

    /// Whether the handler is currently registered.
    #[wasm_bindgen(getter)]
    pub fn observing(&self) -> bool {
        self.inner.is_observing()
    }
}

impl std::fmt::Debug for JsLayoutObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsLayoutObserver")
            .field("inner", &self.inner)
            .finish()
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use relayout_core::host::Host;
    use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn truthy_throttle_values_are_coerced() {
        assert_eq!(
            throttle_option(&JsValue::from_str("100")),
            Some(Duration::from_millis(100))
        );
        assert_eq!(throttle_option(&JsValue::TRUE), Some(Duration::from_millis(1)));
        assert_eq!(
            throttle_option(&JsValue::from_f64(16.0)),
            Some(Duration::from_millis(16))
        );
        assert_eq!(throttle_option(&JsValue::FALSE), None);
        assert_eq!(throttle_option(&JsValue::UNDEFINED), None);
        assert_eq!(throttle_option(&JsValue::from_str("")), None);
        assert_eq!(throttle_option(&JsValue::from_str("soon")), None);
    }

    #[wasm_bindgen_test]
    fn same_function_shares_one_registration() {
        let engine = shared_engine().expect("browser document");
        let before = engine.handler_count();
        let f = Function::new_no_args("");
        let a = JsLayoutObserver::new(f.clone(), None).expect("observer");
        let b = JsLayoutObserver::new(f, None).expect("observer");

        a.observe();
        b.observe();
        assert_eq!(engine.handler_count(), before + 1);

        a.disconnect();
        assert!(!b.observing());
        assert_eq!(engine.handler_count(), before);
    }

    #[wasm_bindgen_test]
    fn throttled_observers_register_separately() {
        let engine = shared_engine().expect("browser document");
        let before = engine.handler_count();
        let f = Function::new_no_args("");
        let options = Object::new();
        Reflect::set(&options, &JsValue::from_str("throttle"), &JsValue::from_f64(50.0))
            .expect("set option");
        let a = JsLayoutObserver::new(f.clone(), Some(options.clone())).expect("observer");
        let b = JsLayoutObserver::new(f, Some(options)).expect("observer");

        a.observe();
        b.observe();
        assert_eq!(engine.handler_count(), before + 2);
        drop(a);
        drop(b);
        assert_eq!(engine.handler_count(), before);
    }

    #[wasm_bindgen_test]
    fn handler_exceptions_reach_global_error_event() {
        Function::new_no_args(
            "globalThis.__relayoutErrors = 0;
             globalThis.addEventListener('error', (e) => {
                 globalThis.__relayoutErrors += 1;
                 e.preventDefault();
             }, { once: true });",
        )
        .call0(&JsValue::UNDEFINED)
        .expect("install error listener");

        let handler = js_handler(Function::new_no_args("throw new Error('boom');"));
        handler.on_layout_change(Trigger::Mutation);

        let errors = Reflect::get(&js_sys::global(), &JsValue::from_str("__relayoutErrors"))
            .expect("read counter");
        assert_eq!(errors.as_f64(), Some(1.0));
    }

    #[wasm_bindgen_test]
    fn web_host_reads_document_ready_state() {
        let host = WebHost::new().expect("browser document");
        assert!(host.ready_state().is_content_loaded());
    }
}
