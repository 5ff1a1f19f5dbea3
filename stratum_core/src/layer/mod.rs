// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer tree data model.
//!
//! A *layer* is a node in a compositing tree. Each layer has:
//!
//! - An identity ([`LayerId`]): a generational handle that becomes stale when
//!   the layer is destroyed, preventing use-after-free bugs at the API level.
//! - Topology: parent, first-child, and sibling links forming an ordered
//!   tree. Child order is paint order, back to front.
//! - **Local properties** set by the caller: transforms, anchor point,
//!   position, bounds, opacity, [`LayerFlags`], contents scale mode, scroll
//!   delta, mask and replica attachments, and animation state.
//!
//! Nothing derived is stored here. Draw transforms, clip rects and render
//! surfaces live in a [`DrawFrame`](crate::draw::DrawFrame) produced by
//! [`calculate_draw_properties`](LayerStore::calculate_draw_properties).
//!
//! # Dirty tracking
//!
//! Property mutations automatically mark the corresponding dirty channel
//! (see [`dirty`](crate::dirty)); [`LayerStore::drain_changes`] reports them.

mod changes;
mod id;
mod store;
mod traverse;

pub use changes::FrameChanges;
pub use id::{INVALID, LayerId};
pub use store::{LayerAnimation, LayerFlags, LayerStore};
pub use traverse::Children;
