// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer tree and draw-property computation for compositing.
//!
//! `stratum_core` turns a tree of compositing layers, each with its own
//! local transform, into the globally consistent data a compositor draws
//! from: draw and screen-space transforms, clip and visibility rectangles,
//! render surfaces, and paint order. It is `no_std` compatible (with
//! `alloc`) and uses array-based struct-of-arrays storage with index handles
//! for cache-friendly traversal.
//!
//! # Architecture
//!
//! ```text
//!   LayerStore (local properties, set by the caller)
//!       │
//!       ▼
//!   calculate_draw_properties(root, DrawInputs) ──► DrawFrame
//!                                                      │
//!                 ┌────────────────────────────────────┤
//!                 ▼                                    ▼
//!   back_to_front() / front_to_back()     find_layer_hit_by_point()
//!
//!   LayerStore::drain_changes() ──► FrameChanges (damage tracking)
//! ```
//!
//! **[`layer`]**: Struct-of-arrays layer tree with generational handles.
//! Properties (transforms, anchor, position, bounds, opacity, flags, scroll
//! delta, mask and replica attachments) are set by the caller.
//!
//! **[`draw`]**: The tree walk, render-surface formation, contents scale,
//! fixed-position scroll compensation, paint-order iteration and hit
//! testing. Results live in a [`DrawFrame`](draw::DrawFrame), never in the
//! store.
//!
//! **[`geometry`]**: Rectangle, quad and point mapping with clipping against
//! the viewer plane, plus visible-rect calculation.
//!
//! **[`transform`]**: Column-major 4×4 transform type.
//!
//! **[`dirty`]**: Multi-channel dirty tracking via `understory_dirty`.
//! GEOMETRY and OPACITY propagate to descendants; CONTENT is local-only;
//! TOPOLOGY records structural changes.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! calculation instrumentation, with zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-layer
//!   cull and damage-rect events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod dirty;
pub mod draw;
pub mod geometry;
pub mod layer;
pub mod trace;
pub mod transform;
