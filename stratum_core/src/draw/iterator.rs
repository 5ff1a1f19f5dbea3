// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint-order iteration over a computed frame.
//!
//! Every surface's layer list mixes layers with entries for contributing
//! child surfaces. The iterators here expand those entries in place, so a
//! consumer sees the whole frame as one sequence of positions:
//!
//! - [`TargetSurface`](LayerIteratorPosition::TargetSurface): subsequent
//!   layers draw into this surface (back to front), or the surface is
//!   finished (front to back).
//! - [`Layer`](LayerIteratorPosition::Layer): a layer drawing into the
//!   current target.
//! - [`ContributingSurface`](LayerIteratorPosition::ContributingSurface): a
//!   finished child surface composited into the current target.
//!
//! [`FrontToBack`] yields exactly the reverse of [`BackToFront`].

use alloc::vec::Vec;
use core::iter::FusedIterator;

use crate::layer::LayerId;

use super::DrawFrame;

/// One step of a paint-order walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerIteratorPosition {
    /// The surface owned by this layer is the current target.
    TargetSurface(LayerId),
    /// The surface owned by this layer is composited into the current
    /// target.
    ContributingSurface(LayerId),
    /// This layer's own content draws into the current target.
    Layer(LayerId),
}

impl LayerIteratorPosition {
    /// The layer this position refers to.
    #[must_use]
    pub const fn layer(self) -> LayerId {
        match self {
            Self::TargetSurface(id) | Self::ContributingSurface(id) | Self::Layer(id) => id,
        }
    }

    /// Whether the position stands for the layer's own content.
    #[must_use]
    pub const fn represents_itself(self) -> bool {
        matches!(self, Self::Layer(_))
    }

    /// Whether the position is a surface becoming or ceasing to be the target.
    #[must_use]
    pub const fn represents_target_render_surface(self) -> bool {
        matches!(self, Self::TargetSurface(_))
    }

    /// Whether the position is a child surface composited into its target.
    #[must_use]
    pub const fn represents_contributing_render_surface(self) -> bool {
        matches!(self, Self::ContributingSurface(_))
    }
}

fn layer_list(frame: &DrawFrame, target: LayerId) -> &[LayerId] {
    frame
        .render_surface(target)
        .map_or(&[], |rs| rs.layer_list.as_slice())
}

/// Back-to-front iterator returned by [`DrawFrame::back_to_front`].
#[derive(Clone, Debug)]
pub struct BackToFront<'a> {
    frame: &'a DrawFrame,
    /// Targets being drawn and the next entry of each.
    stack: Vec<(LayerId, usize)>,
    started: bool,
}

impl Iterator for BackToFront<'_> {
    type Item = LayerIteratorPosition;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            let root = self.frame.root?;
            if self.frame.render_surface(root).is_none() {
                return None;
            }
            self.stack.push((root, 0));
            return Some(LayerIteratorPosition::TargetSurface(root));
        }
        let (target, next) = self.stack.last_mut()?;
        let target = *target;
        let list = layer_list(self.frame, target);
        if let Some(&entry) = list.get(*next) {
            *next += 1;
            if self.frame.is_contributing_surface(target, entry) {
                self.stack.push((entry, 0));
                return Some(LayerIteratorPosition::TargetSurface(entry));
            }
            return Some(LayerIteratorPosition::Layer(entry));
        }
        self.stack.pop();
        // The root surface has no target to contribute to.
        (!self.stack.is_empty()).then_some(LayerIteratorPosition::ContributingSurface(target))
    }
}

impl FusedIterator for BackToFront<'_> {}

/// Front-to-back iterator returned by [`DrawFrame::front_to_back`].
#[derive(Clone, Debug)]
pub struct FrontToBack<'a> {
    frame: &'a DrawFrame,
    /// Targets being walked and the number of entries not yet yielded.
    stack: Vec<(LayerId, usize)>,
}

impl Iterator for FrontToBack<'_> {
    type Item = LayerIteratorPosition;

    fn next(&mut self) -> Option<Self::Item> {
        let (target, remaining) = self.stack.last_mut()?;
        let target = *target;
        if *remaining == 0 {
            self.stack.pop();
            return Some(LayerIteratorPosition::TargetSurface(target));
        }
        *remaining -= 1;
        let entry = layer_list(self.frame, target)[*remaining];
        if self.frame.is_contributing_surface(target, entry) {
            let len = layer_list(self.frame, entry).len();
            self.stack.push((entry, len));
            return Some(LayerIteratorPosition::ContributingSurface(entry));
        }
        Some(LayerIteratorPosition::Layer(entry))
    }
}

impl FusedIterator for FrontToBack<'_> {}

impl DrawFrame {
    /// Walks the frame in drawing order, starting with the root surface.
    ///
    /// An empty frame yields nothing.
    #[must_use]
    pub fn back_to_front(&self) -> BackToFront<'_> {
        BackToFront {
            frame: self,
            stack: Vec::new(),
            started: false,
        }
    }

    /// Walks the frame in reverse drawing order, the order used for hit
    /// testing.
    #[must_use]
    pub fn front_to_back(&self) -> FrontToBack<'_> {
        let mut stack = Vec::new();
        if let Some(root) = self.root
            && let Some(rs) = self.render_surface(root)
        {
            stack.push((root, rs.layer_list.len()));
        }
        FrontToBack { frame: self, stack }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use kurbo::Size;

    use super::LayerIteratorPosition::{ContributingSurface, Layer, TargetSurface};
    use super::*;
    use crate::draw::DrawInputs;
    use crate::layer::{LayerFlags, LayerStore};

    fn layer(store: &mut LayerStore, size: f64) -> LayerId {
        let id = store.create_layer();
        store.set_bounds(id, Size::new(size, size));
        store.set_flags(id, LayerFlags::drawing());
        id
    }

    #[test]
    fn empty_frame_yields_nothing() {
        let frame = DrawFrame::new();
        assert_eq!(frame.back_to_front().next(), None);
        assert_eq!(frame.front_to_back().next(), None);
    }

    #[test]
    fn single_layer() {
        let mut store = LayerStore::new();
        let root = layer(&mut store, 10.0);
        let mut frame = DrawFrame::new();
        store.calculate_draw_properties(root, &DrawInputs::new(Size::new(10.0, 10.0)), &mut frame);

        let order: Vec<_> = frame.back_to_front().collect();
        assert_eq!(order, [TargetSurface(root), Layer(root)]);
    }

    #[test]
    fn nested_surfaces_expand_in_place() {
        // root
        // ├── a (surface)
        // │   └── b
        // └── c
        let mut store = LayerStore::new();
        let root = layer(&mut store, 100.0);
        let a = layer(&mut store, 10.0);
        let b = layer(&mut store, 10.0);
        let c = layer(&mut store, 10.0);
        store.add_child(root, a);
        store.add_child(a, b);
        store.add_child(root, c);
        store.set_opacity(a, 0.5);

        let mut frame = DrawFrame::new();
        store.calculate_draw_properties(root, &DrawInputs::new(Size::new(100.0, 100.0)), &mut frame);

        let back: Vec<_> = frame.back_to_front().collect();
        assert_eq!(
            back,
            [
                TargetSurface(root),
                Layer(root),
                TargetSurface(a),
                Layer(a),
                Layer(b),
                ContributingSurface(a),
                Layer(c),
            ]
        );

        let mut front: Vec<_> = frame.front_to_back().collect();
        front.reverse();
        assert_eq!(front, back);
    }

    #[test]
    fn position_predicates() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        assert!(Layer(id).represents_itself());
        assert!(TargetSurface(id).represents_target_render_surface());
        assert!(ContributingSurface(id).represents_contributing_render_surface());
        assert!(!ContributingSurface(id).represents_itself());
        assert_eq!(ContributingSurface(id).layer(), id);
    }
}
