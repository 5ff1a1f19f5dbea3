// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-surface formation.
//!
//! A layer gets its own surface when its subtree cannot be drawn directly
//! into the ancestor's target: group opacity, masks, reflections, rotated
//! clips, and flattening out of a 3D context all need an intermediate
//! texture. Surfaces composite 1:1 onto their target, so the owner's 2-D
//! scale is moved inside the surface as the `sublayer_scale`.

use kurbo::{Rect, Size, Vec2};

use crate::geometry::{enclosing_rect, project_clipped_rect};
use crate::layer::{INVALID, LayerStore};
use crate::trace::SurfaceReason;
use crate::transform::Transform3d;

use super::{DrawInputs, RenderSurface};

/// Returns the first trigger that makes the non-root layer at `idx` own a
/// surface, or `None` if it draws straight into its parent's target.
pub(crate) fn surface_reason(
    store: &LayerStore,
    idx: u32,
    combined: &Transform3d,
    descendant_draws_content: bool,
    parent_preserves_3d: bool,
) -> Option<SurfaceReason> {
    let i = idx as usize;
    let flags = store.flags[i];
    if flags.force_render_surface {
        return Some(SurfaceReason::Forced);
    }
    if store.mask_layer[i] != INVALID {
        return Some(SurfaceReason::Mask);
    }
    if store.replica_layer[i] != INVALID {
        return Some(SurfaceReason::Replica);
    }
    if store.opacity[i] < 1.0 && descendant_draws_content {
        return Some(SurfaceReason::Opacity);
    }
    if flags.masks_to_bounds && !combined.is_scale_or_translation() {
        return Some(SurfaceReason::ClipNotAxisAligned);
    }
    if parent_preserves_3d && !flags.preserves_3d && descendant_draws_content {
        return Some(SurfaceReason::Flattening);
    }
    None
}

/// The scale baked into everything drawn into a surface owned by a layer
/// with the given combined transform.
///
/// Perspective has no 2-D scale; those surfaces raster at device × page
/// scale. Degenerate scales fall back to 1 so the surface transform stays
/// invertible.
pub(crate) fn sublayer_scale(combined: &Transform3d, inputs: &DrawInputs) -> Vec2 {
    let fallback = inputs.device_scale_factor * inputs.page_scale_factor;
    let (sx, sy) = combined
        .scale_components_2d()
        .unwrap_or((fallback, fallback));
    let usable = |s: f64| if s.is_finite() && s > 0.0 { s } else { 1.0 };
    Vec2::new(usable(sx), usable(sy))
}

/// Maps surface space to the replica's surface space.
///
/// The replica layer's transform is applied about its anchor point, in the
/// owner's layout space, with the surface's sublayer scale undone around it.
pub(crate) fn replica_origin_transform(
    store: &LayerStore,
    replica: u32,
    owner_bounds: Size,
    sublayer_scale: Vec2,
) -> Transform3d {
    let r = replica as usize;
    let anchor = store.anchor_point[r];
    let anchor = Vec2::new(anchor.x * owner_bounds.width, anchor.y * owner_bounds.height);
    let origin = store.position[r].to_vec2() + anchor;
    Transform3d::from_scale(sublayer_scale.x, sublayer_scale.y, 1.0)
        * Transform3d::from_translation(origin.x, origin.y, 0.0)
        * store.transform[r]
        * Transform3d::from_translation(-anchor.x, -anchor.y, 0.0)
        * Transform3d::from_scale(1.0 / sublayer_scale.x, 1.0 / sublayer_scale.y, 1.0)
}

/// The surface's clip brought into surface space, or `None` when the surface
/// is unclipped.
///
/// Layers drawing into the surface are visible only inside this rectangle. A
/// surface transform without an inverse hides everything.
pub(crate) fn clip_in_surface_space(rs: &RenderSurface) -> Option<Rect> {
    if !rs.is_clipped {
        return None;
    }
    Some(rs.draw_transform.inverse().map_or(Rect::ZERO, |inv| {
        enclosing_rect(project_clipped_rect(&inv, rs.clip_rect))
    }))
}
