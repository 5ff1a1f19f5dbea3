// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for draw-property calculation.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! tree walk calls as it forms and prunes render surfaces. All method bodies
//! default to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates per-layer [`LayerCulledEvent`]
//!   and [`DamageRect`] events plus the corresponding `TraceSink` methods.

use crate::draw::DrawStats;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why a layer owns a render surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceReason {
    /// The root of the calculation always owns one.
    Root,
    /// The layer forces a surface.
    Forced,
    /// The layer has a mask layer.
    Mask,
    /// The layer has a replica layer.
    Replica,
    /// The layer is translucent and has drawing descendants.
    Opacity,
    /// The layer clips its subtree while rotated or skewed.
    ClipNotAxisAligned,
    /// The layer flattens its subtree inside a parent's 3D context.
    Flattening,
}

impl SurfaceReason {
    /// All reasons, in tag order.
    pub const ALL: [Self; 7] = [
        Self::Root,
        Self::Forced,
        Self::Mask,
        Self::Replica,
        Self::Opacity,
        Self::ClipNotAxisAligned,
        Self::Flattening,
    ];

    /// A short lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Forced => "forced",
            Self::Mask => "mask",
            Self::Replica => "replica",
            Self::Opacity => "opacity",
            Self::ClipNotAxisAligned => "clip_not_axis_aligned",
            Self::Flattening => "flattening",
        }
    }
}

/// Why a formed render surface was removed again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PruneReason {
    /// Nothing in the subtree was drawn into the surface.
    EmptyLayerList,
    /// The surface's content lies entirely outside its clip.
    ClippedOut,
}

impl PruneReason {
    /// A short lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyLayerList => "empty_layer_list",
            Self::ClippedOut => "clipped_out",
        }
    }
}

/// Why a layer was left out of its target's layer list.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CullReason {
    /// Opacity 0 without an opacity animation; the whole subtree is skipped.
    Transparent,
    /// The layer is single-sided and faces away from the viewer.
    BackFace,
}

#[cfg(feature = "trace-rich")]
impl CullReason {
    /// A short lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transparent => "transparent",
            Self::BackFace => "back_face",
        }
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a calculation starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalculateBeginEvent {
    /// Slot index of the root layer.
    pub root_index: u32,
    /// Live layers in the store.
    pub layer_count: u32,
    /// Viewport width in device pixels.
    pub viewport_width: f64,
    /// Viewport height in device pixels.
    pub viewport_height: f64,
    /// Device scale factor.
    pub device_scale_factor: f64,
    /// Page scale factor.
    pub page_scale_factor: f64,
}

/// Emitted when a layer forms a render surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceCreatedEvent {
    /// Slot index of the owning layer.
    pub layer_index: u32,
    /// The first trigger that applied.
    pub reason: SurfaceReason,
}

/// Emitted when a formed surface is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfacePrunedEvent {
    /// Slot index of the owning layer.
    pub layer_index: u32,
    /// Why it was removed.
    pub reason: PruneReason,
}

/// Emitted when a layer is culled.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerCulledEvent {
    /// Slot index of the layer.
    pub layer_index: u32,
    /// Why it was culled.
    pub reason: CullReason,
}

/// An axis-aligned damage rectangle in device pixels.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from draw-property calculation.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a calculation starts.
    fn on_calculate_begin(&mut self, e: &CalculateBeginEvent) {
        _ = e;
    }

    /// Called when a layer forms a render surface.
    fn on_surface_created(&mut self, e: &SurfaceCreatedEvent) {
        _ = e;
    }

    /// Called when a formed surface is removed.
    fn on_surface_pruned(&mut self, e: &SurfacePrunedEvent) {
        _ = e;
    }

    /// Called when a calculation finishes.
    fn on_calculate_end(&mut self, stats: &DrawStats) {
        _ = stats;
    }

    /// Called when a layer is culled (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_layer_culled(&mut self, e: &LayerCulledEvent) {
        _ = e;
    }

    /// Called with per-frame damage rectangles (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        _ = (frame_index, rects);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`CalculateBeginEvent`].
    #[inline]
    pub fn calculate_begin(&mut self, e: &CalculateBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_calculate_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SurfaceCreatedEvent`].
    #[inline]
    pub fn surface_created(&mut self, e: &SurfaceCreatedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_surface_created(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SurfacePrunedEvent`].
    #[inline]
    pub fn surface_pruned(&mut self, e: &SurfacePrunedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_surface_pruned(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits the end-of-calculation [`DrawStats`].
    #[inline]
    pub fn calculate_end(&mut self, stats: &DrawStats) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_calculate_end(stats);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = stats;
        }
    }

    /// Emits a [`LayerCulledEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn layer_culled(&mut self, e: &LayerCulledEvent) {
        if let Some(s) = &mut self.sink {
            s.on_layer_culled(e);
        }
    }

    /// Emits damage rectangles (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        if let Some(s) = &mut self.sink {
            s.on_damage_rects(frame_index, rects);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_begin() -> CalculateBeginEvent {
        CalculateBeginEvent {
            root_index: 0,
            layer_count: 3,
            viewport_width: 800.0,
            viewport_height: 600.0,
            device_scale_factor: 2.0,
            page_scale_factor: 1.0,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_calculate_begin(&sample_begin());
        sink.on_surface_created(&SurfaceCreatedEvent {
            layer_index: 1,
            reason: SurfaceReason::Opacity,
        });
        sink.on_calculate_end(&DrawStats::default());
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.calculate_begin(&sample_begin());
        tracer.surface_pruned(&SurfacePrunedEvent {
            layer_index: 2,
            reason: PruneReason::ClippedOut,
        });
    }

    #[test]
    fn reason_names_are_distinct() {
        for (i, a) in SurfaceReason::ALL.iter().enumerate() {
            for b in &SurfaceReason::ALL[i + 1..] {
                assert_ne!(a.as_str(), b.as_str());
            }
        }
        assert_ne!(
            PruneReason::EmptyLayerList.as_str(),
            PruneReason::ClippedOut.as_str()
        );
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            surfaces: Vec<u32>,
        }
        impl TraceSink for RecordingSink {
            fn on_surface_created(&mut self, e: &SurfaceCreatedEvent) {
                self.surfaces.push(e.layer_index);
            }
        }

        let mut sink = RecordingSink {
            surfaces: Vec::new(),
        };
        let mut tracer = Tracer::new(&mut sink);
        tracer.surface_created(&SurfaceCreatedEvent {
            layer_index: 7,
            reason: SurfaceReason::Forced,
        });
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.surfaces, &[7]);
    }
}
