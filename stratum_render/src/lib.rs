// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render planning and damage tracking for stratum.
//!
//! This crate sits between [`stratum_core`]'s draw-property computation and
//! a backend that actually puts pixels on screen. It provides:
//!
//! - [`RenderPlan`]: the render passes of one frame, deepest surface first,
//!   each a back-to-front list of [`RenderItem`]s.
//! - [`DamageTracker`]: compares successive frames and reports the
//!   [`DamageRegion`] that needs repainting.
//!
//! ```
//! use kurbo::Size;
//! use stratum_core::draw::{DrawFrame, DrawInputs};
//! use stratum_core::layer::{LayerFlags, LayerStore};
//! use stratum_render::{DamageRegion, DamageTracker, RenderPlan};
//!
//! let mut store = LayerStore::new();
//! let root = store.create_layer();
//! store.set_bounds(root, Size::new(64.0, 64.0));
//! store.set_flags(root, LayerFlags::drawing());
//!
//! let mut frame = DrawFrame::new();
//! let mut tracker = DamageTracker::new();
//! let changes = store.drain_changes();
//! store.calculate_draw_properties(root, &DrawInputs::new(Size::new(64.0, 64.0)), &mut frame);
//!
//! let plan = RenderPlan::build(&store, &frame);
//! assert_eq!(plan.passes.len(), 1);
//! assert_eq!(tracker.update(&frame, &changes), DamageRegion::Full);
//! ```

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod damage;
mod plan;

pub use damage::{DamageRegion, DamageTracker};
pub use plan::{ItemKind, RenderItem, RenderPass, RenderPlan};
