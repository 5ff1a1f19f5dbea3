// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw-property calculation.
//!
//! [`LayerStore::calculate_draw_properties`](crate::layer::LayerStore::calculate_draw_properties)
//! walks a layer tree once and fills a [`DrawFrame`] with everything a
//! compositor needs to draw it:
//!
//! - per-layer [`LayerDrawProperties`]: draw and screen-space transforms,
//!   draw opacity, clip, drawable and visible rectangles, contents scale and
//!   render target;
//! - one [`RenderSurface`] per layer that needs an intermediate texture,
//!   listed pre-order in the render surface list, each with the layer list
//!   drawn into it back to front.
//!
//! The frame can then be walked in paint order with
//! [`DrawFrame::back_to_front`] and [`DrawFrame::front_to_back`], or
//! queried with [`find_layer_hit_by_point`].
//!
//! ```
//! use kurbo::{Point, Size};
//! use stratum_core::draw::{DrawFrame, DrawInputs, find_layer_hit_by_point};
//! use stratum_core::layer::{LayerFlags, LayerStore};
//!
//! let mut store = LayerStore::new();
//! let root = store.create_layer();
//! store.set_bounds(root, Size::new(100.0, 100.0));
//! store.set_flags(root, LayerFlags::drawing());
//!
//! let mut frame = DrawFrame::new();
//! store.calculate_draw_properties(root, &DrawInputs::new(Size::new(100.0, 100.0)), &mut frame);
//! assert_eq!(frame.render_surface_list(), &[root]);
//! assert_eq!(
//!     find_layer_hit_by_point(&store, &frame, Point::new(50.0, 50.0)),
//!     Some(root)
//! );
//! ```

mod contents_scale;
mod frame;
mod inputs;
mod iterator;
mod scroll;
mod sort;
mod surface;
mod walk;

pub use contents_scale::ContentsScaleMode;
pub use frame::{DrawFrame, DrawStats, LayerDrawProperties, RenderSurface};
pub use hit_test::find_layer_hit_by_point;
pub use inputs::DrawInputs;
pub use iterator::{BackToFront, FrontToBack, LayerIteratorPosition};
