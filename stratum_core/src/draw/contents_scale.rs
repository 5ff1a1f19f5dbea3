// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raster scale selection.
//!
//! A layer rasterizes its content at `contents_scale` pixels per layout
//! unit. For [`ContentsScaleMode::Automatic`] layers the scale follows the
//! device scale, the page scale, and whatever magnification ancestors apply,
//! so that content stays sharp when an ancestor scales it up. Magnification
//! below 1 is ignored: content is never rasterized below device resolution.

use kurbo::Size;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::geometry::snap;
use crate::transform::Transform3d;

use super::DrawInputs;

/// How a layer's contents scale is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ContentsScaleMode {
    /// Derived from device scale, page scale and ancestor magnification.
    #[default]
    Automatic,
    /// Always the given scale.
    Fixed(f64),
    /// Always 1. The draw transform carries all of the scale, so the layer
    /// is stretched rather than re-rasterized.
    Unscaled,
}

/// The resolved raster size of one layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ContentsScale {
    pub(crate) content_bounds: Size,
    pub(crate) x: f64,
    pub(crate) y: f64,
}

impl ContentsScale {
    /// Scale factors that turn `bounds` into `ceil(bounds * scale)`.
    pub(crate) fn for_bounds(bounds: Size, scale: f64) -> Self {
        let content_bounds = Size::new(
            snap(bounds.width * scale).ceil(),
            snap(bounds.height * scale).ceil(),
        );
        let per_axis = |content: f64, layout: f64| {
            if layout > 0.0 { content / layout } else { scale }
        };
        Self {
            content_bounds,
            x: per_axis(content_bounds.width, bounds.width),
            y: per_axis(content_bounds.height, bounds.height),
        }
    }

    /// The transform from content pixels to layout units.
    pub(crate) fn content_to_layer(&self) -> Transform3d {
        Transform3d::from_scale(1.0 / self.x, 1.0 / self.y, 1.0)
    }
}

/// Chooses the raster scale of a layer.
///
/// `parent_matrix` is the transform handed to the layer by its parent, in
/// target surface pixels. It excludes the layer's own transform, so a layer
/// animating its own scale does not re-rasterize every frame.
pub(crate) fn resolve_contents_scale(
    mode: ContentsScaleMode,
    bounds_contain_page_scale: bool,
    parent_matrix: &Transform3d,
    animating_to_screen: bool,
    inputs: &DrawInputs,
) -> f64 {
    match mode {
        ContentsScaleMode::Fixed(scale) => scale,
        ContentsScaleMode::Unscaled => 1.0,
        ContentsScaleMode::Automatic => {
            let device = inputs.device_scale_factor;
            let page = if bounds_contain_page_scale {
                1.0
            } else {
                inputs.page_scale_factor
            };
            let chain = if animating_to_screen {
                1.0
            } else {
                parent_matrix
                    .scale_components_2d()
                    .map_or(1.0, |(sx, sy)| (sx.max(sy) / device).max(1.0))
            };
            device * page * chain
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Size;

    use super::*;

    fn inputs(device: f64, page: f64) -> DrawInputs {
        DrawInputs::new(Size::new(100.0, 100.0))
            .with_device_scale_factor(device)
            .with_page_scale_factor(page)
    }

    #[test]
    fn automatic_follows_device_and_page_scale() {
        let s = resolve_contents_scale(
            ContentsScaleMode::Automatic,
            false,
            &Transform3d::from_scale(2.0, 2.0, 1.0),
            false,
            &inputs(2.0, 1.5),
        );
        assert_eq!(s, 3.0);
    }

    #[test]
    fn page_scale_skipped_when_bounds_contain_it() {
        let s = resolve_contents_scale(
            ContentsScaleMode::Automatic,
            true,
            &Transform3d::IDENTITY,
            false,
            &inputs(1.0, 3.0),
        );
        assert_eq!(s, 1.0);
    }

    #[test]
    fn ancestor_magnification_raises_scale() {
        let s = resolve_contents_scale(
            ContentsScaleMode::Automatic,
            false,
            &Transform3d::from_scale(2.0, 4.0, 1.0),
            false,
            &inputs(1.0, 1.0),
        );
        assert_eq!(s, 4.0);
    }

    #[test]
    fn minification_is_ignored() {
        let s = resolve_contents_scale(
            ContentsScaleMode::Automatic,
            false,
            &Transform3d::from_scale(0.25, 0.25, 1.0),
            false,
            &inputs(2.0, 1.0),
        );
        assert_eq!(s, 2.0);
    }

    #[test]
    fn animation_and_perspective_pin_the_chain() {
        let animating = resolve_contents_scale(
            ContentsScaleMode::Automatic,
            false,
            &Transform3d::from_scale(5.0, 5.0, 1.0),
            true,
            &inputs(1.0, 1.0),
        );
        assert_eq!(animating, 1.0);
        let perspective = resolve_contents_scale(
            ContentsScaleMode::Automatic,
            false,
            &Transform3d::from_perspective(10.0),
            false,
            &inputs(2.0, 1.0),
        );
        assert_eq!(perspective, 2.0);
    }

    #[test]
    fn fixed_and_unscaled_ignore_inputs() {
        let parent = Transform3d::from_scale(3.0, 3.0, 1.0);
        assert_eq!(
            resolve_contents_scale(ContentsScaleMode::Fixed(1.5), false, &parent, false, &inputs(2.0, 2.0)),
            1.5
        );
        assert_eq!(
            resolve_contents_scale(ContentsScaleMode::Unscaled, false, &parent, false, &inputs(2.0, 2.0)),
            1.0
        );
    }

    #[test]
    fn content_bounds_round_up() {
        let cs = ContentsScale::for_bounds(Size::new(10.0, 3.0), 1.5);
        assert_eq!(cs.content_bounds, Size::new(15.0, 5.0));
        assert_eq!(cs.x, 1.5);
        assert!((cs.y - 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn content_bounds_ignore_round_off() {
        let cs = ContentsScale::for_bounds(Size::new(10.0, 10.0), 1.1);
        assert_eq!(cs.content_bounds, Size::new(11.0, 11.0));
    }

    #[test]
    fn empty_bounds_keep_the_scale() {
        let cs = ContentsScale::for_bounds(Size::ZERO, 2.0);
        assert_eq!(cs.content_bounds, Size::ZERO);
        assert_eq!((cs.x, cs.y), (2.0, 2.0));
    }
}
