// Copyright 2026 the Relayout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and JSON export for relayout diagnostics.
//!
//! This crate provides [`TraceSink`](relayout_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`] — human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`] — in-memory recording, readable while the
//!   sink is installed in an engine.
//! - [`json::export`] — writes recorded events as JSON Lines.
//!
//! Depending on this crate turns on `relayout_core`'s `trace` feature.

pub mod json;
pub mod pretty;
pub mod recorder;
