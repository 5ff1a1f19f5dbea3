// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll compensation for fixed-position layers.
//!
//! Scrolling a layer moves its whole subtree. Layers flagged
//! `fixed_to_container_layer` must stay put relative to their nearest
//! container, so the walk carries a matrix that undoes every scroll delta
//! applied between the container and the current layer. Fixed layers
//! pre-multiply their combined transform with it.

use kurbo::Vec2;

use crate::transform::Transform3d;

/// Computes the compensation matrix handed to the children of a layer.
///
/// - `parent_matrix`: the transform the layer received from its parent.
/// - `surface_draw`: the draw transform of the surface the layer owns, if
///   any. Children of a surface live in surface space, so the matrix is
///   conjugated into it.
/// - `inherited`: the compensation the layer itself received.
pub(crate) fn compensation_for_children(
    is_container: bool,
    scroll_delta: Vec2,
    parent_matrix: &Transform3d,
    surface_draw: Option<&Transform3d>,
    inherited: &Transform3d,
) -> Transform3d {
    let scrolls = scroll_delta != Vec2::ZERO;
    if !is_container && !scrolls && surface_draw.is_none() {
        return *inherited;
    }

    let mut m = if is_container {
        Transform3d::IDENTITY
    } else {
        *inherited
    };

    if scrolls {
        // Undo the delta in the parent's space: parent * T(d) * parent^-1.
        let undo = parent_matrix.inverse().map_or(Transform3d::IDENTITY, |inv| {
            *parent_matrix * Transform3d::from_translation(scroll_delta.x, scroll_delta.y, 0.0) * inv
        });
        m = m * undo;
    }

    if let Some(draw) = surface_draw
        && !m.is_identity()
        && let Some(inv) = draw.inverse()
    {
        m = inv * m * *draw;
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: Transform3d = Transform3d::IDENTITY;

    fn assert_near(a: Transform3d, b: Transform3d) {
        for (ca, cb) in a.cols.iter().zip(b.cols.iter()) {
            for (x, y) in ca.iter().zip(cb.iter()) {
                assert!((x - y).abs() < 1e-9, "{a:?} != {b:?}");
            }
        }
    }

    #[test]
    fn passthrough_without_container_scroll_or_surface() {
        let inherited = Transform3d::from_translation(3.0, 4.0, 0.0);
        let m = compensation_for_children(false, Vec2::ZERO, &ID, None, &inherited);
        assert_eq!(m, inherited);
    }

    #[test]
    fn container_resets_inherited() {
        let inherited = Transform3d::from_translation(3.0, 4.0, 0.0);
        let m = compensation_for_children(true, Vec2::ZERO, &ID, None, &inherited);
        assert_eq!(m, ID);
    }

    #[test]
    fn scrolling_container_compensates_its_delta() {
        let m = compensation_for_children(true, Vec2::new(10.0, 10.0), &ID, None, &ID);
        assert_near(m, Transform3d::from_translation(10.0, 10.0, 0.0));
    }

    #[test]
    fn delta_is_taken_through_the_parent_matrix() {
        let parent = Transform3d::from_scale(2.0, 2.0, 1.0);
        let m = compensation_for_children(true, Vec2::new(5.0, 0.0), &parent, None, &ID);
        assert_near(m, Transform3d::from_translation(10.0, 0.0, 0.0));
    }

    #[test]
    fn nested_scrollers_accumulate() {
        let outer = compensation_for_children(true, Vec2::new(1.0, 0.0), &ID, None, &ID);
        let inner = compensation_for_children(false, Vec2::new(0.0, 2.0), &ID, None, &outer);
        assert_near(inner, Transform3d::from_translation(1.0, 2.0, 0.0));
    }

    #[test]
    fn surface_conjugates_into_surface_space() {
        let inherited = Transform3d::from_translation(10.0, 0.0, 0.0);
        let draw = Transform3d::from_scale(2.0, 2.0, 1.0);
        let m = compensation_for_children(false, Vec2::ZERO, &ID, Some(&draw), &inherited);
        assert_near(m, Transform3d::from_translation(5.0, 0.0, 0.0));
    }
}
