// Copyright 2026 the Relayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `setTimeout`-backed [`Timers`].
//!
//! Each scheduled callback is wrapped in a JS closure kept alive in a slot
//! table until it fires or is cleared. The [`TimeoutId`] handed to the engine
//! is the slot key, not the browser's timer id.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use relayout_core::host::{TimeoutId, Timers};
use relayout_core::time::{Duration, HostTime};

// Direct global bindings instead of `web_sys::Window` methods, so timers work
// without fetching (and unwrapping) the Window object on every call.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(handler: &JsValue, timeout: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

/// Returns the current host time from `performance.now()`.
#[must_use]
pub fn now() -> HostTime {
    let ms = performance_now();
    #[expect(
        clippy::cast_possible_truncation,
        reason = "performance.now() returns small positive f64; µs fits in u64"
    )]
    let us = (ms * 1000.0) as u64;
    HostTime(us)
}

/// Whole milliseconds for `setTimeout`, rounded up so the callback never runs
/// before `delay` has elapsed on the microsecond clock.
fn timeout_ms(delay: Duration) -> i32 {
    i32::try_from(delay.ticks().div_ceil(1000)).unwrap_or(i32::MAX)
}

struct Slot {
    browser_id: i32,
    _closure: Closure<dyn FnMut()>,
}

type Slots = Rc<RefCell<HashMap<u32, Slot>>>;

/// Browser timers. Cloning shares the slot table.
#[derive(Clone, Default)]
pub struct WebTimers {
    slots: Slots,
    next_key: Rc<Cell<u32>>,
}

impl WebTimers {
    /// Creates an empty timer table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Timers for WebTimers {
    fn now(&self) -> HostTime {
        now()
    }

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimeoutId {
        let key = self.next_key.get().wrapping_add(1);
        self.next_key.set(key);

        let slots = Rc::downgrade(&self.slots);
        let closure = Closure::once(move || {
            // Dropping the closure mid-call is fine: wasm-bindgen defers the
            // free until the invocation returns.
            if let Some(slots) = slots.upgrade() {
                slots.borrow_mut().remove(&key);
            }
            callback();
        });

        let browser_id = set_timeout(closure.as_ref(), timeout_ms(delay));
        self.slots.borrow_mut().insert(
            key,
            Slot {
                browser_id,
                _closure: closure,
            },
        );
        TimeoutId(key)
    }

    fn clear_timeout(&self, id: TimeoutId) {
        let slot = self.slots.borrow_mut().remove(&id.0);
        if let Some(slot) = slot {
            clear_timeout(slot.browser_id);
        }
    }
}

impl std::fmt::Debug for WebTimers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebTimers")
            .field("pending", &self.slots.borrow().len())
            .finish_non_exhaustive()
    }
}
