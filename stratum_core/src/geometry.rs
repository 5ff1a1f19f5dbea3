// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle, quad, and point mapping through projective transforms.
//!
//! Mapping a flat layer through a 3-D transform with perspective can push
//! parts of it behind the viewer (homogeneous `w <= 0`). Dividing by such a
//! `w` produces points mirrored through the eye, so everything here clips
//! against the `w = 0` plane first. Edges that cross the plane are cut at
//! [`W_CLIP_EPSILON`] just in front of the viewer, which keeps the results
//! finite while still conservative.
//!
//! Rectangles are [`kurbo::Rect`] in `x0, y0, x1, y1` form. A rectangle with
//! non-positive width or height is empty; empty results are normalized to
//! [`Rect::ZERO`] so that frames compare equal regardless of how emptiness
//! was reached.

use kurbo::{Point, Rect, Vec2};
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::transform::Transform3d;

/// The `w` at which edges crossing behind the viewer are cut.
pub const W_CLIP_EPSILON: f64 = 1e-5;

/// Coordinates closer than this to an integer are snapped before rounding
/// outward in [`enclosing_rect`].
const SNAP_EPSILON: f64 = 1e-5;

/// A point in homogeneous coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HomogeneousPoint {
    /// X.
    pub x: f64,
    /// Y.
    pub y: f64,
    /// Z.
    pub z: f64,
    /// W.
    pub w: f64,
}

impl HomogeneousPoint {
    /// Whether this point lies on or behind the viewer's plane.
    #[inline]
    #[must_use]
    pub fn should_be_clipped(self) -> bool {
        self.w <= 0.0
    }

    /// Divides through by `w`.
    ///
    /// A zero `w` yields the origin; callers are expected to check
    /// [`should_be_clipped`](Self::should_be_clipped) first.
    #[must_use]
    pub fn to_point(self) -> Point {
        if self.w == 1.0 {
            return Point::new(self.x, self.y);
        }
        if self.w == 0.0 {
            return Point::ZERO;
        }
        let inv_w = 1.0 / self.w;
        Point::new(self.x * inv_w, self.y * inv_w)
    }

    /// Divides through by `w`, keeping z.
    #[must_use]
    pub fn to_point3(self) -> [f64; 3] {
        if self.w == 0.0 {
            return [0.0; 3];
        }
        let inv_w = 1.0 / self.w;
        [self.x * inv_w, self.y * inv_w, self.z * inv_w]
    }
}

/// Four points in winding order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    /// Vertices, in the order top-left, top-right, bottom-right, bottom-left
    /// for quads built from rectangles.
    pub points: [Point; 4],
}

impl Quad {
    /// The quad covering `rect`.
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            points: [
                Point::new(rect.x0, rect.y0),
                Point::new(rect.x1, rect.y0),
                Point::new(rect.x1, rect.y1),
                Point::new(rect.x0, rect.y1),
            ],
        }
    }

    /// Axis-aligned bounding box of the vertices.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        bounding_box(&self.points)
    }
}

/// A quad after clipping against the viewer plane: at most eight vertices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClippedQuad {
    points: [Point; 8],
    len: usize,
}

impl ClippedQuad {
    const EMPTY: Self = Self {
        points: [Point::ZERO; 8],
        len: 0,
    };

    fn push(&mut self, p: Point) {
        debug_assert!(self.len < 8, "a clipped quad has at most eight vertices");
        self.points[self.len] = p;
        self.len += 1;
    }

    /// The surviving vertices, in the winding order of the source quad.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points[..self.len]
    }

    /// Whether the whole quad was behind the viewer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Axis-aligned bounding box of the surviving vertices.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        if self.len == 0 {
            return Rect::ZERO;
        }
        bounding_box(self.points())
    }
}

// ---------------------------------------------------------------------------
// Rectangle helpers
// ---------------------------------------------------------------------------

/// Whether `rect` has no area (or is NaN).
#[inline]
#[must_use]
pub fn is_empty(rect: Rect) -> bool {
    !(rect.width() > 0.0 && rect.height() > 0.0)
}

/// Intersection of two rectangles; [`Rect::ZERO`] when they do not overlap.
#[must_use]
pub fn intersect(a: Rect, b: Rect) -> Rect {
    let r = Rect::new(a.x0.max(b.x0), a.y0.max(b.y0), a.x1.min(b.x1), a.y1.min(b.y1));
    if is_empty(r) { Rect::ZERO } else { r }
}

/// Bounding union of two rectangles. Empty inputs do not contribute.
#[must_use]
pub fn union(a: Rect, b: Rect) -> Rect {
    if is_empty(a) {
        return if is_empty(b) { Rect::ZERO } else { b };
    }
    if is_empty(b) {
        return a;
    }
    a.union(b)
}

/// Whether `outer` fully covers `inner` (edges may touch).
#[must_use]
pub fn contains_rect(outer: Rect, inner: Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && outer.x1 >= inner.x1 && outer.y1 >= inner.y1
}

/// Smallest integer rectangle containing `rect`.
///
/// Coordinates within a small epsilon of an integer are snapped first, so
/// that round-off from rotations does not grow the result by a whole pixel.
#[must_use]
pub fn enclosing_rect(rect: Rect) -> Rect {
    if is_empty(rect) {
        return Rect::ZERO;
    }
    Rect::new(
        snap(rect.x0).floor(),
        snap(rect.y0).floor(),
        snap(rect.x1).ceil(),
        snap(rect.y1).ceil(),
    )
}

/// Rounds `v` to the nearest integer when it is within rounding error of it.
pub(crate) fn snap(v: f64) -> f64 {
    let r = v.round();
    if (v - r).abs() < SNAP_EPSILON { r } else { v }
}

fn bounding_box(points: &[Point]) -> Rect {
    let mut r = Rect::from_points(points[0], points[0]);
    for &p in &points[1..] {
        r = Rect::new(r.x0.min(p.x), r.y0.min(p.y), r.x1.max(p.x), r.y1.max(p.y));
    }
    r
}

// ---------------------------------------------------------------------------
// Homogeneous mapping
// ---------------------------------------------------------------------------

fn map_homogeneous(t: &Transform3d, p: Point) -> HomogeneousPoint {
    let [x, y, z, w] = t.transform_vec4([p.x, p.y, 0.0, 1.0]);
    HomogeneousPoint { x, y, z, w }
}

/// Maps `p` (at z = 0 in the destination) back onto the source plane.
///
/// The ray through `p` along the destination z axis is intersected with the
/// transformed z = 0 plane. A plane seen edge-on has no intersection and
/// yields a clipped point.
fn project_homogeneous(t: &Transform3d, p: Point) -> HomogeneousPoint {
    let c = &t.cols;
    if c[2][2] == 0.0 {
        return HomogeneousPoint {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 0.0,
        };
    }
    let z = -(c[0][2] * p.x + c[1][2] * p.y + c[3][2]) / c[2][2];
    let [x, y, z, w] = t.transform_vec4([p.x, p.y, z, 1.0]);
    HomogeneousPoint { x, y, z, w }
}

/// Point where the edge `h1 -> h2` crosses `w = W_CLIP_EPSILON`.
fn clip_edge(h1: HomogeneousPoint, h2: HomogeneousPoint) -> HomogeneousPoint {
    let t = (W_CLIP_EPSILON - h1.w) / (h2.w - h1.w);
    let lerp = |a: f64, b: f64| (1.0 - t) * a + t * b;
    HomogeneousPoint {
        x: lerp(h1.x, h2.x),
        y: lerp(h1.y, h2.y),
        z: lerp(h1.z, h2.z),
        w: W_CLIP_EPSILON,
    }
}

fn clip_polygon(hs: &[HomogeneousPoint; 4]) -> ClippedQuad {
    let mut out = ClippedQuad::EMPTY;
    for i in 0..4 {
        let a = hs[i];
        let b = hs[(i + 1) % 4];
        if !a.should_be_clipped() {
            out.push(a.to_point());
        }
        if a.should_be_clipped() != b.should_be_clipped() {
            out.push(clip_edge(a, b).to_point());
        }
    }
    out
}

fn enclosing_clipped(hs: &[HomogeneousPoint; 4]) -> Rect {
    if hs.iter().all(|h| !h.should_be_clipped()) {
        return bounding_box(&hs.map(HomogeneousPoint::to_point));
    }
    clip_polygon(hs).bounding_box()
}

/// Maps `p` through `t`. The flag is `true` if the result lies behind the
/// viewer, in which case the point is meaningless.
#[must_use]
pub fn map_point(t: &Transform3d, p: Point) -> (Point, bool) {
    if t.is_identity_or_translation() {
        return (p + translation_2d(t), false);
    }
    let h = map_homogeneous(t, p);
    (h.to_point(), h.should_be_clipped())
}

/// Maps a 3-D point through `t`, dividing by `w`.
#[must_use]
pub fn map_point3(t: &Transform3d, p: [f64; 3]) -> ([f64; 3], bool) {
    let [x, y, z, w] = t.transform_vec4([p[0], p[1], p[2], 1.0]);
    let h = HomogeneousPoint { x, y, z, w };
    (h.to_point3(), h.should_be_clipped())
}

/// Un-projects `p` onto the plane that `t` maps z = 0 to. The flag is `true`
/// if no valid intersection exists in front of the viewer.
#[must_use]
pub fn project_point(t: &Transform3d, p: Point) -> (Point, bool) {
    if t.is_identity_or_translation() {
        return (p + translation_2d(t), false);
    }
    let h = project_homogeneous(t, p);
    (h.to_point(), h.should_be_clipped())
}

/// Maps all four vertices of `q`. The flag is `true` if any vertex lies
/// behind the viewer.
#[must_use]
pub fn map_quad(t: &Transform3d, q: &Quad) -> (Quad, bool) {
    if t.is_identity_or_translation() {
        let d = translation_2d(t);
        return (
            Quad {
                points: q.points.map(|p| p + d),
            },
            false,
        );
    }
    let hs = q.points.map(|p| map_homogeneous(t, p));
    let clipped = hs.iter().any(|h| h.should_be_clipped());
    (
        Quad {
            points: hs.map(HomogeneousPoint::to_point),
        },
        clipped,
    )
}

/// Un-projects all four vertices of `q`. The flag is `true` if any vertex
/// has no valid intersection.
#[must_use]
pub fn project_quad(t: &Transform3d, q: &Quad) -> (Quad, bool) {
    let hs = q.points.map(|p| project_homogeneous(t, p));
    let clipped = hs.iter().any(|h| h.should_be_clipped());
    (
        Quad {
            points: hs.map(HomogeneousPoint::to_point),
        },
        clipped,
    )
}

/// Maps `q` through `t`, cutting away the part behind the viewer.
#[must_use]
pub fn map_clipped_quad(t: &Transform3d, q: &Quad) -> ClippedQuad {
    clip_polygon(&q.points.map(|p| map_homogeneous(t, p)))
}

/// Bounding box of `rect` mapped through `t`, clipped to the part in front
/// of the viewer. Fully clipped rectangles map to [`Rect::ZERO`].
#[must_use]
pub fn map_clipped_rect(t: &Transform3d, rect: Rect) -> Rect {
    if t.is_identity_or_translation() {
        return rect + translation_2d(t);
    }
    let q = Quad::from_rect(rect);
    enclosing_clipped(&q.points.map(|p| map_homogeneous(t, p)))
}

/// Bounding box of `rect` un-projected through `t`, clipped like
/// [`map_clipped_rect`].
#[must_use]
pub fn project_clipped_rect(t: &Transform3d, rect: Rect) -> Rect {
    if t.is_identity_or_translation() {
        return rect + translation_2d(t);
    }
    let q = Quad::from_rect(rect);
    enclosing_clipped(&q.points.map(|p| project_homogeneous(t, p)))
}

/// Returns the part of `layer_rect` (in layer space) that can be visible
/// inside `target_rect` (in target space), given the layer-to-target
/// transform.
///
/// The result is conservative: it may be larger than the true visible
/// region (rotations give axis-aligned bounds), never smaller. A transform
/// without an inverse makes the whole layer invisible.
#[must_use]
pub fn calculate_visible_rect(target_rect: Rect, layer_rect: Rect, transform: &Transform3d) -> Rect {
    if is_empty(layer_rect) {
        return Rect::ZERO;
    }
    let Some(target_to_layer) = transform.inverse() else {
        return Rect::ZERO;
    };
    let in_target = enclosing_rect(map_clipped_rect(transform, layer_rect));
    if is_empty(in_target) {
        return Rect::ZERO;
    }
    if contains_rect(target_rect, in_target) {
        return layer_rect;
    }

    // Only un-project the part of the target the layer can reach; corners of
    // the full target may sit behind the projection point.
    let minimal = intersect(target_rect, in_target);
    if is_empty(minimal) {
        return Rect::ZERO;
    }
    let in_layer = enclosing_rect(project_clipped_rect(&target_to_layer, minimal));
    intersect(in_layer, layer_rect)
}

fn translation_2d(t: &Transform3d) -> Vec2 {
    Vec2::new(t.cols[3][0], t.cols[3][1])
}

#[cfg(test)]
mod tests {
    use core::f64::consts::FRAC_PI_4;

    use super::*;

    fn layer_rect() -> Rect {
        Rect::new(0.0, 0.0, 30.0, 30.0)
    }

    #[test]
    fn visible_rect_fully_inside() {
        let target = Rect::new(0.0, 0.0, 100.0, 100.0);
        let t = Transform3d::from_translation(10.0, 10.0, 0.0);
        assert_eq!(calculate_visible_rect(target, layer_rect(), &t), layer_rect());
    }

    #[test]
    fn visible_rect_fully_outside() {
        let target = Rect::new(0.0, 0.0, 100.0, 100.0);
        let t = Transform3d::from_translation(200.0, 200.0, 0.0);
        assert_eq!(calculate_visible_rect(target, layer_rect(), &t), Rect::ZERO);
    }

    #[test]
    fn visible_rect_partially_outside() {
        let target = Rect::new(0.0, 0.0, 100.0, 100.0);
        let t = Transform3d::from_translation(80.0, 80.0, 0.0);
        assert_eq!(
            calculate_visible_rect(target, layer_rect(), &t),
            Rect::new(0.0, 0.0, 20.0, 20.0)
        );
    }

    #[test]
    fn visible_rect_rotated_about_corner_clips_left_half() {
        // Rotating by 45 degrees about the origin and shifting up leaves the
        // left half of the layer above the target.
        let target = Rect::new(0.0, 0.0, 100.0, 100.0);
        let shift = 2.0_f64.sqrt() * 15.0;
        let t = Transform3d::from_translation(0.0, -shift, 0.0) * Transform3d::from_rotation_z(FRAC_PI_4);
        assert_eq!(
            calculate_visible_rect(target, layer_rect(), &t),
            Rect::new(15.0, 0.0, 30.0, 30.0)
        );
    }

    #[test]
    fn visible_rect_with_perspective_keeps_front_half() {
        // The layer is rotated so that its left half ends up behind the
        // viewer.
        let target = Rect::new(-50.0, -50.0, 50.0, 50.0);
        let layer = Rect::new(-10.0, -1.0, 10.0, 1.0);
        let t = Transform3d::from_perspective(1.0)
            * Transform3d::from_translation(-2.0, 0.0, 1.0)
            * Transform3d::from_rotation_y(FRAC_PI_4);

        let (_, clipped) = map_quad(&t, &Quad::from_rect(layer));
        assert!(clipped, "part of the layer is behind the viewer");

        assert_eq!(
            calculate_visible_rect(target, layer, &t),
            Rect::new(0.0, -1.0, 10.0, 1.0)
        );
    }

    #[test]
    fn visible_rect_with_perspective_entirely_in_view() {
        let target = Rect::new(-50.0, -50.0, 50.0, 50.0);
        let layer = Rect::new(-10.0, -10.0, 10.0, 10.0);
        let t = Transform3d::from_perspective(1.0)
            * Transform3d::from_translation(0.0, 0.0, -27.0)
            * Transform3d::from_rotation_x(FRAC_PI_4)
            * Transform3d::from_rotation_y(FRAC_PI_4);
        assert_eq!(calculate_visible_rect(target, layer, &t), layer);
    }

    #[test]
    fn visible_rect_behind_viewer_is_empty() {
        let target = Rect::new(-50.0, -50.0, 50.0, 50.0);
        let layer = Rect::new(-10.0, -10.0, 10.0, 10.0);
        let t = Transform3d::from_perspective(1.0) * Transform3d::from_translation(0.0, 0.0, 2.0);
        assert_eq!(calculate_visible_rect(target, layer, &t), Rect::ZERO);
    }

    #[test]
    fn visible_rect_singular_transform_is_empty() {
        let target = Rect::new(0.0, 0.0, 100.0, 100.0);
        let t = Transform3d::from_scale(0.0, 1.0, 1.0) * Transform3d::from_translation(-200.0, 0.0, 0.0);
        assert_eq!(calculate_visible_rect(target, layer_rect(), &t), Rect::ZERO);
    }

    #[test]
    fn visible_rect_flat_z_scale_is_empty_even_when_footprint_fits() {
        // Collapsing z keeps the 2D footprint inside the target, but the
        // transform has no inverse.
        let target = Rect::new(0.0, 0.0, 100.0, 100.0);
        let t = Transform3d::from_scale(1.0, 1.0, 0.0);
        assert!(!is_empty(map_clipped_rect(&t, layer_rect())));
        assert_eq!(calculate_visible_rect(target, layer_rect(), &t), Rect::ZERO);
    }

    #[test]
    fn map_clipped_quad_cuts_at_viewer_plane() {
        let layer = Rect::new(-10.0, -1.0, 10.0, 1.0);
        let t = Transform3d::from_perspective(1.0)
            * Transform3d::from_translation(-2.0, 0.0, 1.0)
            * Transform3d::from_rotation_y(FRAC_PI_4);
        let clipped = map_clipped_quad(&t, &Quad::from_rect(layer));
        // Two vertices survive and each crossing edge contributes one.
        assert_eq!(clipped.points().len(), 4);

        let all_behind = Transform3d::from_perspective(1.0) * Transform3d::from_translation(0.0, 0.0, 2.0);
        assert!(map_clipped_quad(&all_behind, &Quad::from_rect(layer)).is_empty());
        assert_eq!(map_clipped_rect(&all_behind, layer), Rect::ZERO);
    }

    #[test]
    fn map_point_translation_fast_path() {
        let t = Transform3d::from_translation(5.0, -3.0, 0.0);
        assert_eq!(map_point(&t, Point::new(1.0, 1.0)), (Point::new(6.0, -2.0), false));
    }

    #[test]
    fn map_point_reports_clipping() {
        let t = Transform3d::from_perspective(1.0) * Transform3d::from_translation(0.0, 0.0, 2.0);
        let (_, clipped) = map_point(&t, Point::new(1.0, 1.0));
        assert!(clipped);
    }

    #[test]
    fn project_point_inverts_map_point() {
        let t = Transform3d::from_perspective(100.0)
            * Transform3d::from_rotation_y(0.5)
            * Transform3d::from_rotation_x(-0.3);
        let p = Point::new(7.0, -4.0);
        let (mapped, clipped) = map_point(&t, p);
        assert!(!clipped);
        let inv = t.inverse().unwrap();
        let (back, clipped) = project_point(&inv, mapped);
        assert!(!clipped);
        assert!(
            (back.x - p.x).abs() < 1e-9 && (back.y - p.y).abs() < 1e-9,
            "got {back:?}"
        );
    }

    #[test]
    fn project_point_edge_on_plane_is_clipped() {
        // Exact 90 degree rotation about Y.
        let t = Transform3d::from_cols(
            [0.0, 0.0, -1.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        );
        let (_, clipped) = project_point(&t, Point::new(1.0, 1.0));
        assert!(clipped);
    }

    #[test]
    fn enclosing_rect_snaps_near_integers() {
        let r = Rect::new(0.000_001, 1.999_999_9, 10.4, 20.0);
        assert_eq!(enclosing_rect(r), Rect::new(0.0, 2.0, 11.0, 20.0));
        assert_eq!(enclosing_rect(Rect::new(5.0, 5.0, 5.0, 9.0)), Rect::ZERO);
    }

    #[test]
    fn rect_helpers() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 20.0, 20.0);
        let far = Rect::new(50.0, 50.0, 60.0, 60.0);
        assert_eq!(intersect(a, b), Rect::new(5.0, 5.0, 10.0, 10.0));
        assert_eq!(intersect(a, far), Rect::ZERO);
        assert_eq!(union(a, Rect::ZERO), a);
        assert_eq!(union(Rect::ZERO, b), b);
        assert_eq!(union(a, b), Rect::new(0.0, 0.0, 20.0, 20.0));
        assert!(contains_rect(a, Rect::new(0.0, 0.0, 10.0, 5.0)));
        assert!(!contains_rect(a, b));
        assert!(is_empty(Rect::new(3.0, 3.0, 3.0, 8.0)));
        assert!(is_empty(Rect::new(f64::NAN, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn quad_bounding_box() {
        let t = Transform3d::from_rotation_z(FRAC_PI_4);
        let (q, clipped) = map_quad(&t, &Quad::from_rect(Rect::new(0.0, 0.0, 2.0, 2.0)));
        assert!(!clipped);
        let bb = q.bounding_box();
        let d = 2.0_f64.sqrt();
        assert!((bb.x0 + d).abs() < 1e-9);
        assert!((bb.x1 - d).abs() < 1e-9);
        assert!(bb.y0.abs() < 1e-9);
        assert!((bb.y1 - 2.0 * d).abs() < 1e-9);
    }
}
