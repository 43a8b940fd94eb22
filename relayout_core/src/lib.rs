// Copyright 2026 the Relayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared layout-change detection engine.
//!
//! `relayout_core` tells interested listeners that the layout of a page *may*
//! have changed. A mutation observer alone misses resizes, animations,
//! transitions, orientation changes, form input, print transitions and
//! late-loading images, so the engine multiplexes all of those onto a single
//! signal. It never says what changed; that is up to the handlers.
//!
//! The crate is `no_std` (with `alloc`) and platform-agnostic. The page is
//! reached only through the [`Host`](host::Host) and [`Timers`](host::Timers)
//! traits, implemented by backend crates (e.g. `relayout_backend_web`) and by
//! test harnesses.
//!
//! # Architecture
//!
//! ```text
//!   Host watchers (mutations, window events, image loads, readiness)
//!       │
//!       ▼  Notifier
//!   Engine ──► registration set ──► Handler::on_layout_change(Trigger)
//!       ▲                                 ▲
//!       │ register / unregister           │ optional
//!   LayoutObserver ──────────────────► Throttle
//! ```
//!
//! **[`engine`]** — The shared engine: one set of watchers for any number of
//! handlers, attached lazily on the first registration and torn down after
//! the last.
//!
//! **[`observer`]** — [`LayoutObserver`](observer::LayoutObserver), the
//! caller-facing handle with idempotent `observe`/`disconnect`.
//!
//! **[`throttle`]** — Leading- and trailing-edge rate limiter.
//!
//! **[`catalog`]** — The fixed list of window events treated as layout
//! signals.
//!
//! **[`host`]** — The platform contract.
//!
//! **[`time`]** — Microsecond host time.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) diagnostics hooks.
//!
//! # Example
//!
//! ```rust,ignore
//! let engine = Engine::new(host, timers);
//! let observer = LayoutObserver::with_options(
//!     &engine,
//!     |trigger: Trigger| reposition_tooltip(trigger),
//!     ObserverOptions::default().throttle_ms(100),
//! );
//! observer.observe();
//! // ...
//! observer.disconnect();
//! ```
//!
//! # Crate features
//!
//! - `std` (disabled by default): Reserved for std-only dependants.
//! - `trace` (disabled by default): Enables delivery of events to an
//!   installed [`TraceSink`](trace::TraceSink).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod catalog;
pub mod engine;
pub mod host;
pub mod observer;
pub mod throttle;
pub mod time;
pub mod trace;

#[cfg(test)]
mod testing;
