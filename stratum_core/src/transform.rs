// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column-major 4×4 transform.
//!
//! This type covers the subset of projective 3-D transforms that the draw
//! property walk needs (composition, inversion, flattening, classification,
//! back-face tests) without pulling in a full linear-algebra crate.
//!
//! Element `m(row, col)` lives at `cols[col][row]`. Points are column vectors,
//! so `a * b` applies `b` first.

use core::ops::Mul;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// A column-major 4×4 transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix, matching the memory layout
/// used by GPU APIs and Core Animation's `CATransform3D`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

/// Determinants smaller than this are treated as singular.
const SINGULAR_EPSILON: f64 = 1e-8;

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a transform from four column arrays.
    #[inline]
    #[must_use]
    pub const fn from_cols(col0: [f64; 4], col1: [f64; 4], col2: [f64; 4], col3: [f64; 4]) -> Self {
        Self {
            cols: [col0, col1, col2, col3],
        }
    }

    /// Creates a transform from a column-major 2-D array.
    #[inline]
    #[must_use]
    pub const fn from_cols_array_2d(cols: [[f64; 4]; 4]) -> Self {
        Self { cols }
    }

    /// Returns the columns as a 2-D array.
    #[inline]
    #[must_use]
    pub const fn to_cols_array_2d(self) -> [[f64; 4]; 4] {
        self.cols
    }

    /// Returns column `i` (0-based).
    ///
    /// # Panics
    ///
    /// Panics if `i >= 4`.
    #[inline]
    #[must_use]
    pub const fn col(self, i: usize) -> [f64; 4] {
        self.cols[i]
    }

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    /// Creates a non-uniform scale transform.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            cols: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, sz, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the Z axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_z(radians: f64) -> Self {
        let (s, c) = sin_cos(radians);
        Self {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the X axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_x(radians: f64) -> Self {
        let (s, c) = sin_cos(radians);
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, c, s, 0.0],
                [0.0, -s, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the Y axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_y(radians: f64) -> Self {
        let (s, c) = sin_cos(radians);
        Self {
            cols: [
                [c, 0.0, -s, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [s, 0.0, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a perspective projection with the eye at `depth` on the
    /// positive Z axis, looking at the z = 0 plane.
    ///
    /// A non-positive depth yields the identity.
    #[inline]
    #[must_use]
    pub fn from_perspective(depth: f64) -> Self {
        let mut t = Self::IDENTITY;
        if depth > 0.0 {
            t.cols[2][3] = -1.0 / depth;
        }
        t
    }

    /// Returns the element at `row`, `col` (0-based).
    #[inline]
    #[must_use]
    pub const fn get(&self, row: usize, col: usize) -> f64 {
        self.cols[col][row]
    }

    /// Returns `self * t`, i.e. `t` applied before `self`.
    #[inline]
    #[must_use]
    pub fn pre_translate(self, x: f64, y: f64, z: f64) -> Self {
        self * Self::from_translation(x, y, z)
    }

    /// Returns `self * s`, i.e. a scale applied before `self`.
    #[inline]
    #[must_use]
    pub fn pre_scale(self, sx: f64, sy: f64, sz: f64) -> Self {
        self * Self::from_scale(sx, sy, sz)
    }

    /// Applies the matrix to a homogeneous column vector.
    #[inline]
    #[must_use]
    pub fn transform_vec4(&self, v: [f64; 4]) -> [f64; 4] {
        let c = &self.cols;
        let mut out = [0.0; 4];
        for (r, o) in out.iter_mut().enumerate() {
            *o = c[0][r] * v[0] + c[1][r] * v[1] + c[2][r] * v[2] + c[3][r] * v[3];
        }
        out
    }

    /// Whether this is exactly the identity matrix.
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Whether the matrix only translates.
    #[must_use]
    pub fn is_identity_or_translation(&self) -> bool {
        let c = &self.cols;
        c[0] == [1.0, 0.0, 0.0, 0.0]
            && c[1] == [0.0, 1.0, 0.0, 0.0]
            && c[2] == [0.0, 0.0, 1.0, 0.0]
            && c[3][3] == 1.0
    }

    /// Whether the matrix is a combination of axis-aligned scale and
    /// translation (no rotation, skew or perspective).
    #[must_use]
    pub fn is_scale_or_translation(&self) -> bool {
        let c = &self.cols;
        c[0][1] == 0.0
            && c[0][2] == 0.0
            && c[0][3] == 0.0
            && c[1][0] == 0.0
            && c[1][2] == 0.0
            && c[1][3] == 0.0
            && c[2][0] == 0.0
            && c[2][1] == 0.0
            && c[2][3] == 0.0
            && c[3][3] == 1.0
    }

    /// Whether the bottom row differs from `(0, 0, 0, 1)`.
    #[inline]
    #[must_use]
    pub fn has_perspective(&self) -> bool {
        let c = &self.cols;
        c[0][3] != 0.0 || c[1][3] != 0.0 || c[2][3] != 0.0 || c[3][3] != 1.0
    }

    /// Returns the determinant.
    #[must_use]
    pub fn determinant(&self) -> f64 {
        let m = |r: usize, c: usize| self.cols[c][r];
        let s0 = m(0, 0) * m(1, 1) - m(1, 0) * m(0, 1);
        let s1 = m(0, 0) * m(1, 2) - m(1, 0) * m(0, 2);
        let s2 = m(0, 0) * m(1, 3) - m(1, 0) * m(0, 3);
        let s3 = m(0, 1) * m(1, 2) - m(1, 1) * m(0, 2);
        let s4 = m(0, 1) * m(1, 3) - m(1, 1) * m(0, 3);
        let s5 = m(0, 2) * m(1, 3) - m(1, 2) * m(0, 3);
        let c5 = m(2, 2) * m(3, 3) - m(3, 2) * m(2, 3);
        let c4 = m(2, 1) * m(3, 3) - m(3, 1) * m(2, 3);
        let c3 = m(2, 1) * m(3, 2) - m(3, 1) * m(2, 2);
        let c2 = m(2, 0) * m(3, 3) - m(3, 0) * m(2, 3);
        let c1 = m(2, 0) * m(3, 2) - m(3, 0) * m(2, 2);
        let c0 = m(2, 0) * m(3, 1) - m(3, 0) * m(2, 1);
        s0 * c5 - s1 * c4 + s2 * c3 + s3 * c2 - s4 * c1 + s5 * c0
    }

    /// Whether the matrix can be inverted.
    #[inline]
    #[must_use]
    pub fn is_invertible(&self) -> bool {
        self.determinant().abs() >= SINGULAR_EPSILON
    }

    /// Returns the inverse, or `None` if the matrix is singular.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        if self.is_identity_or_translation() {
            let t = self.cols[3];
            return Some(Self::from_translation(-t[0], -t[1], -t[2]));
        }
        let m = |r: usize, c: usize| self.cols[c][r];
        let s0 = m(0, 0) * m(1, 1) - m(1, 0) * m(0, 1);
        let s1 = m(0, 0) * m(1, 2) - m(1, 0) * m(0, 2);
        let s2 = m(0, 0) * m(1, 3) - m(1, 0) * m(0, 3);
        let s3 = m(0, 1) * m(1, 2) - m(1, 1) * m(0, 2);
        let s4 = m(0, 1) * m(1, 3) - m(1, 1) * m(0, 3);
        let s5 = m(0, 2) * m(1, 3) - m(1, 2) * m(0, 3);
        let c5 = m(2, 2) * m(3, 3) - m(3, 2) * m(2, 3);
        let c4 = m(2, 1) * m(3, 3) - m(3, 1) * m(2, 3);
        let c3 = m(2, 1) * m(3, 2) - m(3, 1) * m(2, 2);
        let c2 = m(2, 0) * m(3, 3) - m(3, 0) * m(2, 3);
        let c1 = m(2, 0) * m(3, 2) - m(3, 0) * m(2, 2);
        let c0 = m(2, 0) * m(3, 1) - m(3, 0) * m(2, 1);
        let det = s0 * c5 - s1 * c4 + s2 * c3 + s3 * c2 - s4 * c1 + s5 * c0;
        if det.abs() < SINGULAR_EPSILON || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        let mut out = [[0.0_f64; 4]; 4];
        // out[col][row] = inverse(row, col)
        out[0][0] = (m(1, 1) * c5 - m(1, 2) * c4 + m(1, 3) * c3) * inv;
        out[1][0] = (-m(0, 1) * c5 + m(0, 2) * c4 - m(0, 3) * c3) * inv;
        out[2][0] = (m(3, 1) * s5 - m(3, 2) * s4 + m(3, 3) * s3) * inv;
        out[3][0] = (-m(2, 1) * s5 + m(2, 2) * s4 - m(2, 3) * s3) * inv;
        out[0][1] = (-m(1, 0) * c5 + m(1, 2) * c2 - m(1, 3) * c1) * inv;
        out[1][1] = (m(0, 0) * c5 - m(0, 2) * c2 + m(0, 3) * c1) * inv;
        out[2][1] = (-m(3, 0) * s5 + m(3, 2) * s2 - m(3, 3) * s1) * inv;
        out[3][1] = (m(2, 0) * s5 - m(2, 2) * s2 + m(2, 3) * s1) * inv;
        out[0][2] = (m(1, 0) * c4 - m(1, 1) * c2 + m(1, 3) * c0) * inv;
        out[1][2] = (-m(0, 0) * c4 + m(0, 1) * c2 - m(0, 3) * c0) * inv;
        out[2][2] = (m(3, 0) * s4 - m(3, 1) * s2 + m(3, 3) * s0) * inv;
        out[3][2] = (-m(2, 0) * s4 + m(2, 1) * s2 - m(2, 3) * s0) * inv;
        out[0][3] = (-m(1, 0) * c3 + m(1, 1) * c1 - m(1, 2) * c0) * inv;
        out[1][3] = (m(0, 0) * c3 - m(0, 1) * c1 + m(0, 2) * c0) * inv;
        out[2][3] = (-m(3, 0) * s3 + m(3, 1) * s1 - m(3, 2) * s0) * inv;
        out[3][3] = (m(2, 0) * s3 - m(2, 1) * s1 + m(2, 2) * s0) * inv;
        Some(Self { cols: out })
    }

    /// Whether the back side of the z = 0 plane faces the viewer after this
    /// transform.
    ///
    /// This is the sign of the z component of the transformed normal, i.e.
    /// element (2, 2) of the inverse. Singular matrices report `false`.
    #[must_use]
    pub fn is_back_face_visible(&self) -> bool {
        self.inverse().is_some_and(|inv| inv.cols[2][2] < 0.0)
    }

    /// Returns the matrix with its third row and column replaced by
    /// `(0, 0, 1, 0)`, discarding all z contribution.
    #[must_use]
    pub fn flattened_to_2d(self) -> Self {
        let mut t = self;
        t.cols[0][2] = 0.0;
        t.cols[1][2] = 0.0;
        t.cols[3][2] = 0.0;
        t.cols[2] = [0.0, 0.0, 1.0, 0.0];
        t
    }

    /// Returns the 2-D scale factors along the transformed X and Y axes.
    ///
    /// Perspective matrices have no meaningful scale and return `None`.
    #[must_use]
    pub fn scale_components_2d(&self) -> Option<(f64, f64)> {
        if self.has_perspective() {
            return None;
        }
        let c = &self.cols;
        let sx = (c[0][0] * c[0][0] + c[0][1] * c[0][1]).sqrt();
        let sy = (c[1][0] * c[1][0] + c[1][1] * c[1][1]).sqrt();
        Some((sx, sy))
    }

    /// Is this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        let c = &self.cols;
        c[0][0].is_finite()
            && c[0][1].is_finite()
            && c[0][2].is_finite()
            && c[0][3].is_finite()
            && c[1][0].is_finite()
            && c[1][1].is_finite()
            && c[1][2].is_finite()
            && c[1][3].is_finite()
            && c[2][0].is_finite()
            && c[2][1].is_finite()
            && c[2][2].is_finite()
            && c[2][3].is_finite()
            && c[3][0].is_finite()
            && c[3][1].is_finite()
            && c[3][2].is_finite()
            && c[3][3].is_finite()
    }

    /// Is this transform [NaN]?
    ///
    /// [NaN]: f64::is_nan
    #[inline]
    #[must_use]
    pub const fn is_nan(&self) -> bool {
        let c = &self.cols;
        c[0][0].is_nan()
            || c[0][1].is_nan()
            || c[0][2].is_nan()
            || c[0][3].is_nan()
            || c[1][0].is_nan()
            || c[1][1].is_nan()
            || c[1][2].is_nan()
            || c[1][3].is_nan()
            || c[2][0].is_nan()
            || c[2][1].is_nan()
            || c[2][2].is_nan()
            || c[2][3].is_nan()
            || c[3][0].is_nan()
            || c[3][1].is_nan()
            || c[3][2].is_nan()
            || c[3][3].is_nan()
    }
}

#[inline]
fn sin_cos(radians: f64) -> (f64, f64) {
    #[cfg(feature = "std")]
    {
        radians.sin_cos()
    }
    #[cfg(not(feature = "std"))]
    {
        (radians.sin(), radians.cos())
    }
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform3d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        let mut j = 0;
        while j < 4 {
            let mut i = 0;
            while i < 4 {
                out[j][i] =
                    a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
                i += 1;
            }
            j += 1;
        }
        Self { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        assert_eq!(Transform3d::default(), Transform3d::IDENTITY);
    }

    #[test]
    fn identity_multiply() {
        let t = Transform3d::from_translation(1.0, 2.0, 3.0);
        assert_eq!(Transform3d::IDENTITY * t, t);
        assert_eq!(t * Transform3d::IDENTITY, t);
    }

    #[test]
    fn translation_composition() {
        let a = Transform3d::from_translation(1.0, 0.0, 0.0);
        let b = Transform3d::from_translation(0.0, 2.0, 0.0);
        let c = a * b;
        // Combined translation should be (1, 2, 0).
        let col3 = c.col(3);
        assert_eq!(col3, [1.0, 2.0, 0.0, 1.0]);
    }

    #[test]
    fn scale() {
        let s = Transform3d::from_scale(2.0, 3.0, 4.0);
        assert_eq!(s.col(0)[0], 2.0);
        assert_eq!(s.col(1)[1], 3.0);
        assert_eq!(s.col(2)[2], 4.0);
        assert_eq!(s.col(3), [0.0, 0.0, 0.0, 1.0]);
    }


    #[test]
    fn scale_then_translate() {
        let s = Transform3d::from_scale(2.0, 2.0, 2.0);
        let t = Transform3d::from_translation(3.0, 4.0, 0.0);
        // Scale first, then translate: T * S
        let combined = t * s;
        // Column 0 should be scaled.
        assert_eq!(combined.col(0), [2.0, 0.0, 0.0, 0.0]);
        // Translation column should be unchanged (translation applied after).
        assert_eq!(combined.col(3), [3.0, 4.0, 0.0, 1.0]);
    }

    #[test]
    fn rotation_z_ninety_degrees() {
        let r = Transform3d::from_rotation_z(core::f64::consts::FRAC_PI_2);
        // cos=0, sin=1 for +90deg.
        let eps = 1e-6;
        assert!((r.col(0)[0] - 0.0).abs() < eps);
        assert!((r.col(0)[1] - 1.0).abs() < eps);
        assert!((r.col(1)[0] + 1.0).abs() < eps);
        assert!((r.col(1)[1] - 0.0).abs() < eps);
    }

    #[test]
    fn identity_is_finite() {
        assert!(Transform3d::IDENTITY.is_finite());
        assert!(!Transform3d::IDENTITY.is_nan());
    }

    #[test]
    fn nan_detected() {
        let mut t = Transform3d::IDENTITY;
        t.cols[2][1] = f64::NAN;
        assert!(!t.is_finite());
        assert!(t.is_nan());
    }

    #[test]
    fn infinity_detected() {
        let mut t = Transform3d::IDENTITY;
        t.cols[0][3] = f64::INFINITY;
        assert!(!t.is_finite());
        assert!(!t.is_nan());
    }

    fn assert_near(a: Transform3d, b: Transform3d) {
        for c in 0..4 {
            for r in 0..4 {
                assert!(
                    (a.cols[c][r] - b.cols[c][r]).abs() < 1e-9,
                    "mismatch at ({r}, {c}): {a:?} vs {b:?}"
                );
            }
        }
    }

    #[test]
    fn inverse_of_translation() {
        let t = Transform3d::from_translation(3.0, -4.0, 5.0);
        assert_eq!(t.inverse(), Some(Transform3d::from_translation(-3.0, 4.0, -5.0)));
    }

    #[test]
    fn inverse_round_trips_general_matrix() {
        let t = Transform3d::from_perspective(10.0)
            * Transform3d::from_translation(1.0, 2.0, 3.0)
            * Transform3d::from_rotation_y(0.3)
            * Transform3d::from_rotation_x(0.7)
            * Transform3d::from_scale(2.0, 0.5, 1.0);
        let inv = t.inverse().unwrap();
        assert_near(t * inv, Transform3d::IDENTITY);
        assert_near(inv * t, Transform3d::IDENTITY);
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let t = Transform3d::from_scale(1.0, 0.0, 1.0);
        assert!(!t.is_invertible());
        assert_eq!(t.inverse(), None);
        assert_eq!(t.determinant(), 0.0);
    }

    #[test]
    fn determinant_of_scale() {
        let t = Transform3d::from_scale(2.0, 3.0, 4.0);
        assert!((t.determinant() - 24.0).abs() < 1e-12);
    }

    #[test]
    fn classification() {
        assert!(Transform3d::IDENTITY.is_identity());
        assert!(Transform3d::from_translation(1.0, 2.0, 0.0).is_identity_or_translation());
        assert!(!Transform3d::from_scale(2.0, 2.0, 1.0).is_identity_or_translation());
        assert!(
            (Transform3d::from_translation(1.0, 2.0, 0.0) * Transform3d::from_scale(2.0, 3.0, 1.0))
                .is_scale_or_translation()
        );
        assert!(!Transform3d::from_rotation_z(0.1).is_scale_or_translation());
        assert!(Transform3d::from_perspective(100.0).has_perspective());
        assert!(!Transform3d::from_rotation_x(1.0).has_perspective());
    }

    #[test]
    fn back_face_visibility() {
        assert!(!Transform3d::IDENTITY.is_back_face_visible());
        assert!(Transform3d::from_rotation_y(core::f64::consts::PI).is_back_face_visible());
        assert!(Transform3d::from_rotation_x(core::f64::consts::PI).is_back_face_visible());
        assert!(!Transform3d::from_rotation_y(0.4).is_back_face_visible());
        // A singular matrix never shows its back face.
        assert!(!Transform3d::from_scale(1.0, 1.0, 0.0).is_back_face_visible());
    }

    #[test]
    fn flattening_drops_z() {
        let t = Transform3d::from_translation(1.0, 2.0, 3.0) * Transform3d::from_rotation_y(0.5);
        let flat = t.flattened_to_2d();
        assert_eq!(flat.col(2), [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(flat.cols[3][2], 0.0);
        assert_eq!(flat.cols[0][2], 0.0);
        assert_eq!(flat.cols[3][0], 1.0);
        assert_eq!(flat.cols[3][1], 2.0);
    }

    #[test]
    fn scale_components() {
        let t = Transform3d::from_rotation_z(0.8) * Transform3d::from_scale(3.0, 2.0, 1.0);
        let (sx, sy) = t.scale_components_2d().unwrap();
        assert!((sx - 3.0).abs() < 1e-9);
        assert!((sy - 2.0).abs() < 1e-9);
        assert_eq!(Transform3d::from_perspective(5.0).scale_components_2d(), None);
    }

    #[test]
    fn transform_vec4_applies_matrix() {
        let t = Transform3d::from_translation(1.0, 2.0, 3.0) * Transform3d::from_scale(2.0, 2.0, 2.0);
        assert_eq!(t.transform_vec4([1.0, 1.0, 1.0, 1.0]), [3.0, 4.0, 5.0, 1.0]);
    }

    #[test]
    fn perspective_divides_by_depth() {
        let p = Transform3d::from_perspective(2.0);
        let v = p.transform_vec4([1.0, 1.0, 1.0, 1.0]);
        assert_eq!(v[3], 0.5);
    }
}
