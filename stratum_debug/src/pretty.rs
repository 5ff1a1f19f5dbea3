// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use stratum_core::draw::DrawStats;
use stratum_core::trace::{
    CalculateBeginEvent, DamageRect, LayerCulledEvent, SurfaceCreatedEvent, SurfacePrunedEvent,
    TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    calculations: u64,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("calculations", &self.calculations)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            calculations: 0,
        }
    }

    /// Consumes the sink and returns the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_calculate_begin(&mut self, e: &CalculateBeginEvent) {
        self.calculations += 1;
        let _ = writeln!(
            self.writer,
            "[begin] calc={} root={} layers={} viewport={}x{} device={} page={}",
            self.calculations,
            e.root_index,
            e.layer_count,
            e.viewport_width,
            e.viewport_height,
            e.device_scale_factor,
            e.page_scale_factor,
        );
    }

    fn on_surface_created(&mut self, e: &SurfaceCreatedEvent) {
        let _ = writeln!(
            self.writer,
            "[surface] layer={} reason={}",
            e.layer_index,
            e.reason.as_str(),
        );
    }

    fn on_surface_pruned(&mut self, e: &SurfacePrunedEvent) {
        let _ = writeln!(
            self.writer,
            "[prune] layer={} reason={}",
            e.layer_index,
            e.reason.as_str(),
        );
    }

    fn on_calculate_end(&mut self, stats: &DrawStats) {
        let _ = writeln!(
            self.writer,
            "[end] calc={} visited={} drawn={} culled={} surfaces={} pruned={}",
            self.calculations,
            stats.layers_visited,
            stats.layers_drawn,
            stats.layers_culled,
            stats.surfaces,
            stats.surfaces_pruned,
        );
    }

    fn on_layer_culled(&mut self, e: &LayerCulledEvent) {
        let _ = writeln!(
            self.writer,
            "[cull] layer={} reason={}",
            e.layer_index,
            e.reason.as_str(),
        );
    }

    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        let _ = write!(self.writer, "[damage] frame={frame_index} rects={}", rects.len());
        for r in rects {
            let _ = write!(self.writer, " ({},{} {}x{})", r.x, r.y, r.width, r.height);
        }
        let _ = writeln!(self.writer);
    }
}

#[cfg(test)]
mod tests {
    use stratum_core::trace::{CullReason, PruneReason, SurfaceReason};

    use super::*;

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn begin_and_end_share_a_counter() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_calculate_begin(&CalculateBeginEvent {
            root_index: 0,
            layer_count: 3,
            viewport_width: 800.0,
            viewport_height: 600.0,
            device_scale_factor: 2.0,
            page_scale_factor: 1.0,
        });
        sink.on_calculate_end(&DrawStats {
            layers_visited: 3,
            layers_drawn: 2,
            layers_culled: 1,
            surfaces: 1,
            surfaces_pruned: 0,
        });
        let out = output(sink);
        assert!(out.contains("[begin] calc=1 root=0 layers=3 viewport=800x600"), "got: {out}");
        assert!(out.contains("[end] calc=1 visited=3 drawn=2 culled=1"), "got: {out}");
    }

    #[test]
    fn reasons_are_named() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_surface_created(&SurfaceCreatedEvent {
            layer_index: 4,
            reason: SurfaceReason::Opacity,
        });
        sink.on_surface_pruned(&SurfacePrunedEvent {
            layer_index: 4,
            reason: PruneReason::ClippedOut,
        });
        sink.on_layer_culled(&LayerCulledEvent {
            layer_index: 5,
            reason: CullReason::BackFace,
        });
        let out = output(sink);
        assert!(out.contains("[surface] layer=4 reason=opacity"), "got: {out}");
        assert!(out.contains("[prune] layer=4 reason=clipped_out"), "got: {out}");
        assert!(out.contains("[cull] layer=5 reason=back_face"), "got: {out}");
    }

    #[test]
    fn damage_lists_rects() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_damage_rects(
            9,
            &[DamageRect {
                x: 1,
                y: 2,
                width: 3,
                height: 4,
            }],
        );
        assert_eq!(output(sink), "[damage] frame=9 rects=1 (1,2 3x4)\n");
    }
}
