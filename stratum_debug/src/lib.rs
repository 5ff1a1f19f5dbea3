// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and JSON frame dumps for stratum
//! diagnostics.
//!
//! This crate provides [`TraceSink`](stratum_core::trace::TraceSink)
//! implementations for development and post-mortem analysis, plus a way to
//! look at what a calculation produced:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`dump::frame_to_json`]: a JSON description of a computed
//!   [`DrawFrame`](stratum_core::draw::DrawFrame).

pub mod dump;
pub mod pretty;
pub mod recorder;
