// Copyright 2026 the Relayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for relayout.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`WebHost`]: `MutationObserver` on `document.body`, window event
//!   listeners, a capture-phase `load` listener and `DOMContentLoaded`
//! - [`WebTimers`]: `performance.now()` clock and `setTimeout` scheduling
//! - [`shared_engine`]: the per-thread default [`Engine`]
//! - `LayoutObserver`: the class exported to JavaScript

mod bindings;
mod host;
mod timers;

pub use bindings::JsLayoutObserver;
pub use host::WebHost;
pub use timers::{WebTimers, now};

use std::cell::RefCell;
use std::rc::Rc;

use relayout_core::engine::Engine;
use wasm_bindgen::JsValue;

thread_local! {
    static SHARED: RefCell<Option<Engine<WebHost>>> = const { RefCell::new(None) };
}

/// Returns the engine shared by every observer on this thread, creating it
/// on first use.
///
/// # Errors
///
/// Fails when there is no global `window` or `document`.
pub fn shared_engine() -> Result<Engine<WebHost>, JsValue> {
    SHARED.with(|slot| {
        if let Some(engine) = slot.borrow().as_ref() {
            return Ok(engine.clone());
        }
        let engine = Engine::new(WebHost::new()?, Rc::new(WebTimers::new()));
        *slot.borrow_mut() = Some(engine.clone());
        Ok(engine)
    })
}
