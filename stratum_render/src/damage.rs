// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial damage tracking for partial re-rendering.

use alloc::vec::Vec;

use kurbo::Rect;
use stratum_core::draw::{DrawFrame, LayerIteratorPosition};
use stratum_core::geometry::{enclosing_rect, intersect, is_empty, map_clipped_rect, union};
use stratum_core::layer::FrameChanges;
#[cfg(feature = "trace-rich")]
use stratum_core::trace::DamageRect;
use stratum_core::trace::Tracer;

/// A region of the output that needs re-rendering.
///
/// Backends can use this to minimize GPU work by only redrawing areas
/// that changed since the last frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DamageRegion {
    /// The entire output needs redrawing.
    #[default]
    Full,
    /// Axis-aligned rectangles in device pixels that need redrawing.
    Rects(Vec<Rect>),
    /// Nothing changed; the previous frame can be reused.
    None,
}

impl DamageRegion {
    /// Returns `true` if no region needs redrawing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Merges another damage region into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&*self, other) {
            (Self::Full, _) | (_, Self::Full) => *self = Self::Full,
            (Self::None, _) => *self = other.clone(),
            (_, Self::None) => {}
            (Self::Rects(a), Self::Rects(b)) => {
                let mut merged = a.clone();
                merged.extend_from_slice(b);
                *self = Self::Rects(merged);
            }
        }
    }

    /// The bounding box of the damage, or `viewport` for full damage.
    #[must_use]
    pub fn bounds(&self, viewport: Rect) -> Rect {
        match self {
            Self::Full => viewport,
            Self::None => Rect::ZERO,
            Self::Rects(rects) => rects
                .iter()
                .fold(Rect::ZERO, |acc, &r| union(acc, r)),
        }
    }
}

/// Where one slot landed on screen: its own content, and the reflection of
/// the surface it owns.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Footprint {
    content: Option<Rect>,
    replica: Option<Rect>,
}

/// Compares successive frames and reports what needs repainting.
///
/// The tracker remembers where every drawn layer and every surface replica
/// landed on screen. Anything that moved, appeared or disappeared damages
/// both its old and new area; a layer whose content or opacity changed in
/// place damages its area and that of its replica.
#[derive(Clone, Debug, Default)]
pub struct DamageTracker {
    previous: Vec<Footprint>,
    current: Vec<Footprint>,
    viewport: Option<Rect>,
    frame_index: u64,
}

impl DamageTracker {
    /// Creates a tracker whose first update reports full damage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets all history; the next update reports full damage.
    pub fn reset(&mut self) {
        self.previous.clear();
        self.current.clear();
        self.viewport = None;
    }

    /// Number of updates since creation.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Computes the damage between the previous update and `frame`.
    ///
    /// `changes` should hold everything drained from the store since the
    /// previous update.
    pub fn update(&mut self, frame: &DrawFrame, changes: &FrameChanges) -> DamageRegion {
        self.update_traced(frame, changes, &mut Tracer::none())
    }

    /// Like [`update`](Self::update), reporting damage rectangles to
    /// `tracer`.
    pub fn update_traced(
        &mut self,
        frame: &DrawFrame,
        changes: &FrameChanges,
        tracer: &mut Tracer<'_>,
    ) -> DamageRegion {
        self.frame_index += 1;
        self.record(frame);

        let viewport = frame.viewport();
        let first = self.viewport.replace(viewport) != Some(viewport);
        let region = if first {
            DamageRegion::Full
        } else {
            self.diff(changes, viewport)
        };
        core::mem::swap(&mut self.previous, &mut self.current);

        #[cfg(feature = "trace-rich")]
        if let DamageRegion::Rects(rects) = &region {
            let traced: Vec<DamageRect> = rects.iter().map(|&r| to_damage_rect(r)).collect();
            tracer.damage_rects(self.frame_index, &traced);
        }
        #[cfg(not(feature = "trace-rich"))]
        {
            _ = tracer;
        }
        region
    }

    /// Fills `current` with the screen rect of every drawn layer and every
    /// contributing surface's replica.
    fn record(&mut self, frame: &DrawFrame) {
        self.current.clear();
        for pos in frame.back_to_front() {
            let (id, rect, is_replica) = match pos {
                LayerIteratorPosition::Layer(id) => {
                    let Some(props) = frame.layer(id) else {
                        continue;
                    };
                    let rect = map_clipped_rect(
                        &props.screen_space_transform,
                        props.visible_content_rect,
                    );
                    (id, rect, false)
                }
                LayerIteratorPosition::ContributingSurface(id) => {
                    let Some(rs) = frame.render_surface(id).filter(|rs| rs.has_replica) else {
                        continue;
                    };
                    let rect = map_clipped_rect(&rs.replica_screen_space_transform, rs.content_rect);
                    (id, rect, true)
                }
                LayerIteratorPosition::TargetSurface(_) => continue,
            };
            let rect = enclosing_rect(rect);
            if is_empty(rect) {
                continue;
            }
            let i = id.index() as usize;
            if self.current.len() <= i {
                self.current.resize(i + 1, Footprint::default());
            }
            if is_replica {
                self.current[i].replica = Some(rect);
            } else {
                self.current[i].content = Some(rect);
            }
        }
    }

    fn diff(&self, changes: &FrameChanges, viewport: Rect) -> DamageRegion {
        let slot = |v: &[Footprint], i: usize| v.get(i).copied().unwrap_or_default();
        let mut rects = Vec::new();
        let mut push = |r: Rect| {
            let r = intersect(r, viewport);
            if !is_empty(r) {
                rects.push(r);
            }
        };

        let len = self.previous.len().max(self.current.len());
        for i in 0..len {
            let (before, after) = (slot(&self.previous, i), slot(&self.current, i));
            if before.content != after.content {
                before.content.into_iter().chain(after.content).for_each(&mut push);
            }
            if before.replica != after.replica {
                before.replica.into_iter().chain(after.replica).for_each(&mut push);
            }
        }
        for &idx in changes.content.iter().chain(&changes.opacities) {
            let i = idx as usize;
            let (before, after) = (slot(&self.previous, i), slot(&self.current, i));
            if after.content.is_some() && before.content == after.content {
                after.content.into_iter().for_each(&mut push);
            }
            if after.replica.is_some() && before.replica == after.replica {
                after.replica.into_iter().for_each(&mut push);
            }
        }

        if rects.is_empty() {
            DamageRegion::None
        } else {
            DamageRegion::Rects(rects)
        }
    }
}

#[cfg(feature = "trace-rich")]
#[expect(
    clippy::cast_possible_truncation,
    reason = "damage rects are integer-aligned and clipped to the viewport"
)]
fn to_damage_rect(r: Rect) -> DamageRect {
    DamageRect {
        x: r.x0 as i32,
        y: r.y0 as i32,
        width: r.width() as u32,
        height: r.height() as u32,
    }
}
