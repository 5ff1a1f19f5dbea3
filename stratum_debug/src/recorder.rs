// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! [`on_damage_rects`](TraceSink::on_damage_rects) stores only the count.

use stratum_core::draw::DrawStats;
use stratum_core::trace::{
    CalculateBeginEvent, CullReason, DamageRect, LayerCulledEvent, PruneReason,
    SurfaceCreatedEvent, SurfacePrunedEvent, SurfaceReason, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_CALCULATE_BEGIN: u8 = 1;
const TAG_SURFACE_CREATED: u8 = 2;
const TAG_SURFACE_PRUNED: u8 = 3;
const TAG_CALCULATE_END: u8 = 4;
const TAG_LAYER_CULLED: u8 = 5;
const TAG_DAMAGE_RECTS_COUNT: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_surface_reason(&mut self, r: SurfaceReason) {
        self.write_u8(match r {
            SurfaceReason::Root => 0,
            SurfaceReason::Forced => 1,
            SurfaceReason::Mask => 2,
            SurfaceReason::Replica => 3,
            SurfaceReason::Opacity => 4,
            SurfaceReason::ClipNotAxisAligned => 5,
            SurfaceReason::Flattening => 6,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_calculate_begin(&mut self, e: &CalculateBeginEvent) {
        self.write_u8(TAG_CALCULATE_BEGIN);
        self.write_u32(e.root_index);
        self.write_u32(e.layer_count);
        self.write_f64(e.viewport_width);
        self.write_f64(e.viewport_height);
        self.write_f64(e.device_scale_factor);
        self.write_f64(e.page_scale_factor);
    }

    fn on_surface_created(&mut self, e: &SurfaceCreatedEvent) {
        self.write_u8(TAG_SURFACE_CREATED);
        self.write_u32(e.layer_index);
        self.write_surface_reason(e.reason);
    }

    fn on_surface_pruned(&mut self, e: &SurfacePrunedEvent) {
        self.write_u8(TAG_SURFACE_PRUNED);
        self.write_u32(e.layer_index);
        self.write_u8(match e.reason {
            PruneReason::EmptyLayerList => 0,
            PruneReason::ClippedOut => 1,
        });
    }

    fn on_calculate_end(&mut self, s: &DrawStats) {
        self.write_u8(TAG_CALCULATE_END);
        self.write_u32(s.layers_visited);
        self.write_u32(s.layers_drawn);
        self.write_u32(s.layers_culled);
        self.write_u32(s.surfaces);
        self.write_u32(s.surfaces_pruned);
    }

    fn on_layer_culled(&mut self, e: &LayerCulledEvent) {
        self.write_u8(TAG_LAYER_CULLED);
        self.write_u32(e.layer_index);
        self.write_u8(match e.reason {
            CullReason::Transparent => 0,
            CullReason::BackFace => 1,
        });
    }

    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        self.write_u8(TAG_DAMAGE_RECTS_COUNT);
        self.write_u64(frame_index);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "damage rect count capped at u32::MAX for recording"
        )]
        self.write_u32(rects.len().min(u32::MAX as usize) as u32);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`CalculateBeginEvent`].
    CalculateBegin(CalculateBeginEvent),
    /// A [`SurfaceCreatedEvent`].
    SurfaceCreated(SurfaceCreatedEvent),
    /// A [`SurfacePrunedEvent`].
    SurfacePruned(SurfacePrunedEvent),
    /// The [`DrawStats`] reported when a calculation ends.
    CalculateEnd(DrawStats),
    /// A [`LayerCulledEvent`].
    LayerCulled(LayerCulledEvent),
    /// Damage-rect count for a frame.
    DamageRectsCount {
        /// Frame counter.
        frame_index: u64,
        /// Number of damage rects.
        count: u32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.read_array().map(f64::from_le_bytes)
    }

    fn read_surface_reason(&mut self) -> Option<SurfaceReason> {
        SurfaceReason::ALL.get(usize::from(self.read_u8()?)).copied()
    }

    fn decode_calculate_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CalculateBegin(CalculateBeginEvent {
            root_index: self.read_u32()?,
            layer_count: self.read_u32()?,
            viewport_width: self.read_f64()?,
            viewport_height: self.read_f64()?,
            device_scale_factor: self.read_f64()?,
            page_scale_factor: self.read_f64()?,
        }))
    }

    fn decode_surface_created(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SurfaceCreated(SurfaceCreatedEvent {
            layer_index: self.read_u32()?,
            reason: self.read_surface_reason()?,
        }))
    }

    fn decode_surface_pruned(&mut self) -> Option<RecordedEvent> {
        let layer_index = self.read_u32()?;
        let reason = match self.read_u8()? {
            0 => PruneReason::EmptyLayerList,
            _ => PruneReason::ClippedOut,
        };
        Some(RecordedEvent::SurfacePruned(SurfacePrunedEvent {
            layer_index,
            reason,
        }))
    }

    fn decode_calculate_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CalculateEnd(DrawStats {
            layers_visited: self.read_u32()?,
            layers_drawn: self.read_u32()?,
            layers_culled: self.read_u32()?,
            surfaces: self.read_u32()?,
            surfaces_pruned: self.read_u32()?,
        }))
    }

    fn decode_layer_culled(&mut self) -> Option<RecordedEvent> {
        let layer_index = self.read_u32()?;
        let reason = match self.read_u8()? {
            0 => CullReason::Transparent,
            _ => CullReason::BackFace,
        };
        Some(RecordedEvent::LayerCulled(LayerCulledEvent {
            layer_index,
            reason,
        }))
    }

    fn decode_damage_rects_count(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let count = self.read_u32()?;
        Some(RecordedEvent::DamageRectsCount { frame_index, count })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_CALCULATE_BEGIN => self.decode_calculate_begin(),
            TAG_SURFACE_CREATED => self.decode_surface_created(),
            TAG_SURFACE_PRUNED => self.decode_surface_pruned(),
            TAG_CALCULATE_END => self.decode_calculate_end(),
            TAG_LAYER_CULLED => self.decode_layer_culled(),
            TAG_DAMAGE_RECTS_COUNT => self.decode_damage_rects_count(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
