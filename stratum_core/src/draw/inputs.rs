// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame configuration for draw-property calculation.

use kurbo::{Rect, Size};

/// Inputs that apply to a whole draw-property calculation.
///
/// Constructed with [`DrawInputs::new`] and adjusted with the `with_*`
/// builders, all of which are `const`:
///
/// ```
/// use kurbo::Size;
/// use stratum_core::draw::DrawInputs;
///
/// const INPUTS: DrawInputs = DrawInputs::new(Size::new(800.0, 600.0))
///     .with_device_scale_factor(2.0)
///     .with_max_texture_size(4096);
/// assert_eq!(INPUTS.page_scale_factor, 1.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawInputs {
    /// Size of the output in device pixels.
    pub device_viewport_size: Size,
    /// Device pixels per layout pixel.
    pub device_scale_factor: f64,
    /// Page zoom applied on top of the device scale.
    pub page_scale_factor: f64,
    /// Largest width or height a render surface may have, in pixels.
    pub max_texture_size: u32,
    /// Whether layers inside a 3D rendering context are depth sorted.
    pub sort_3d_layers: bool,
}

impl DrawInputs {
    /// Surface size cap used by [`new`](Self::new).
    pub const DEFAULT_MAX_TEXTURE_SIZE: u32 = 8192;

    /// Inputs for a viewport at unit device and page scale.
    #[must_use]
    pub const fn new(device_viewport_size: Size) -> Self {
        Self {
            device_viewport_size,
            device_scale_factor: 1.0,
            page_scale_factor: 1.0,
            max_texture_size: Self::DEFAULT_MAX_TEXTURE_SIZE,
            sort_3d_layers: true,
        }
    }

    /// Returns a copy with the given device scale factor.
    #[must_use]
    pub const fn with_device_scale_factor(mut self, scale: f64) -> Self {
        self.device_scale_factor = scale;
        self
    }

    /// Returns a copy with the given page scale factor.
    #[must_use]
    pub const fn with_page_scale_factor(mut self, scale: f64) -> Self {
        self.page_scale_factor = scale;
        self
    }

    /// Returns a copy with the given surface size cap.
    #[must_use]
    pub const fn with_max_texture_size(mut self, size: u32) -> Self {
        self.max_texture_size = size;
        self
    }

    /// Returns a copy with 3D sorting enabled or disabled.
    #[must_use]
    pub const fn with_3d_sorting(mut self, enabled: bool) -> Self {
        self.sort_3d_layers = enabled;
        self
    }

    /// The viewport as a rectangle at the origin.
    #[must_use]
    pub fn viewport_rect(&self) -> Rect {
        Rect::from_origin_size((0.0, 0.0), self.device_viewport_size)
    }

    /// Panics unless the inputs describe a usable calculation.
    pub(crate) fn validate(&self) {
        assert!(
            self.device_scale_factor.is_finite() && self.device_scale_factor > 0.0,
            "device scale factor must be finite and positive, got {}",
            self.device_scale_factor
        );
        assert!(
            self.page_scale_factor.is_finite() && self.page_scale_factor > 0.0,
            "page scale factor must be finite and positive, got {}",
            self.page_scale_factor
        );
        assert!(
            self.device_viewport_size.width >= 0.0 && self.device_viewport_size.height >= 0.0,
            "viewport size must not be negative, got {:?}",
            self.device_viewport_size
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_are_const() {
        const INPUTS: DrawInputs = DrawInputs::new(Size::new(100.0, 50.0))
            .with_device_scale_factor(2.0)
            .with_page_scale_factor(1.5)
            .with_max_texture_size(256)
            .with_3d_sorting(false);
        assert_eq!(INPUTS.device_scale_factor, 2.0);
        assert_eq!(INPUTS.page_scale_factor, 1.5);
        assert_eq!(INPUTS.max_texture_size, 256);
        assert!(!INPUTS.sort_3d_layers);
        assert_eq!(INPUTS.viewport_rect(), Rect::new(0.0, 0.0, 100.0, 50.0));
    }

    #[test]
    #[should_panic(expected = "device scale factor must be finite and positive")]
    fn zero_device_scale_panics() {
        DrawInputs::new(Size::new(1.0, 1.0))
            .with_device_scale_factor(0.0)
            .validate();
    }

    #[test]
    #[should_panic(expected = "page scale factor must be finite and positive")]
    fn nan_page_scale_panics() {
        DrawInputs::new(Size::new(1.0, 1.0))
            .with_page_scale_factor(f64::NAN)
            .validate();
    }
}
