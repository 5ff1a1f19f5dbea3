// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change tracking between frames.
//!
//! Draw properties are recomputed wholesale by every traversal, so nothing
//! here feeds the engine itself. Instead, [`LayerStore::drain_changes`]
//! tells consumers which layers were touched since the previous drain:
//!
//! 1. **GEOMETRY**: affected indices, including every descendant of a layer
//!    whose transform, position, bounds, flags or scroll delta changed.
//! 2. **OPACITY**: affected indices, including descendants.
//! 3. **CONTENT**: only the layers explicitly marked.
//! 4. **TOPOLOGY**: drained and summarized as a flag.
//!
//! [`FrameChanges`] uses raw slot indices (`u32`) rather than [`LayerId`]
//! handles, matching the keys of a [`DrawFrame`](crate::draw::DrawFrame).
//!
//! [`LayerId`]: super::LayerId

use alloc::vec::Vec;

use super::store::LayerStore;
use crate::dirty;

/// The set of changes reported by a single [`LayerStore::drain_changes`] call.
///
/// Each field contains the raw slot indices of layers that changed in the
/// corresponding category, in ascending order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameChanges {
    /// Layers whose geometry (own or inherited) changed.
    pub geometry: Vec<u32>,
    /// Layers whose opacity (own or inherited) changed.
    pub opacities: Vec<u32>,
    /// Layers whose content changed.
    pub content: Vec<u32>,
    /// Layers created since the last drain.
    pub added: Vec<u32>,
    /// Layers destroyed since the last drain.
    pub removed: Vec<u32>,
    /// Whether the tree topology changed.
    pub topology_changed: bool,
}

impl FrameChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.geometry.clear();
        self.opacities.clear();
        self.content.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Returns whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
            && self.opacities.is_empty()
            && self.content.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

impl LayerStore {
    /// Drains all dirty channels and returns what changed since the last
    /// drain.
    pub fn drain_changes(&mut self) -> FrameChanges {
        let mut changes = FrameChanges::default();
        self.drain_changes_into(&mut changes);
        changes
    }

    /// Like [`drain_changes`](Self::drain_changes), but reuses a
    /// caller-provided buffer to avoid allocation.
    pub fn drain_changes_into(&mut self, changes: &mut FrameChanges) {
        changes.clear();

        changes.topology_changed = self.topology_dirty;
        self.topology_dirty = false;

        changes.geometry.extend(
            self.dirty
                .drain(dirty::GEOMETRY)
                .affected()
                .deterministic()
                .run(),
        );
        changes.opacities.extend(
            self.dirty
                .drain(dirty::OPACITY)
                .affected()
                .deterministic()
                .run(),
        );
        changes
            .content
            .extend(self.dirty.drain(dirty::CONTENT).deterministic().run());

        // Topology is summarized by the flag above.
        let _: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();

        // Destroyed slots may still be reported by the propagating channels.
        let free = &self.free_list;
        changes.geometry.retain(|idx| !free.contains(idx));
        changes.opacities.retain(|idx| !free.contains(idx));
        changes.content.retain(|idx| !free.contains(idx));
        changes.geometry.sort_unstable();
        changes.opacities.sort_unstable();
        changes.content.sort_unstable();

        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Size};

    use crate::draw::ContentsScaleMode;
    use crate::layer::{LayerFlags, LayerStore};
    use crate::transform::Transform3d;

    #[test]
    fn first_drain_reports_creation() {
        let mut store = LayerStore::new();
        let a = store.create_layer();
        let b = store.create_layer();
        store.add_child(a, b);

        let changes = store.drain_changes();
        assert!(changes.topology_changed);
        assert_eq!(changes.added, [a.index(), b.index()]);
        assert!(changes.removed.is_empty());
        assert!(changes.geometry.contains(&b.index()));
    }

    #[test]
    fn second_drain_is_empty() {
        let mut store = LayerStore::new();
        let _ = store.create_layer();
        let _ = store.drain_changes();
        let changes = store.drain_changes();
        assert!(changes.is_empty());
    }

    #[test]
    fn geometry_propagates_to_descendants() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        let child = store.create_layer();
        let grandchild = store.create_layer();
        let sibling = store.create_layer();
        store.add_child(root, child);
        store.add_child(child, grandchild);
        store.add_child(root, sibling);
        let _ = store.drain_changes();

        store.set_transform(child, Transform3d::from_translation(1.0, 0.0, 0.0));
        let changes = store.drain_changes();
        assert_eq!(changes.geometry, [child.index(), grandchild.index()]);
        assert!(changes.opacities.is_empty());
        assert!(!changes.topology_changed);
    }

    #[test]
    fn position_and_bounds_mark_geometry() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        let _ = store.drain_changes();

        store.set_position(id, Point::new(3.0, 4.0));
        assert_eq!(store.drain_changes().geometry, [id.index()]);
        store.set_bounds(id, Size::new(3.0, 4.0));
        assert_eq!(store.drain_changes().geometry, [id.index()]);
    }

    #[test]
    fn opacity_propagates_to_descendants() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();
        store.add_child(parent, child);
        let _ = store.drain_changes();

        store.set_opacity(parent, 0.5);
        let changes = store.drain_changes();
        assert_eq!(changes.opacities, [parent.index(), child.index()]);
        assert!(changes.geometry.is_empty());
    }

    #[test]
    fn content_is_local() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();
        store.add_child(parent, child);
        let _ = store.drain_changes();

        store.set_contents_scale_mode(parent, ContentsScaleMode::Unscaled);
        let changes = store.drain_changes();
        assert_eq!(changes.content, [parent.index()]);
    }

    #[test]
    fn draws_content_marks_content_and_geometry() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        let _ = store.drain_changes();

        store.set_flags(id, LayerFlags::drawing());
        let changes = store.drain_changes();
        assert_eq!(changes.content, [id.index()]);
        assert_eq!(changes.geometry, [id.index()]);
    }

    #[test]
    fn destroy_reports_removed() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();
        store.add_child(parent, child);
        let _ = store.drain_changes();

        store.remove_from_parent(child);
        store.destroy_layer(child);
        let changes = store.drain_changes();
        assert!(changes.topology_changed);
        assert_eq!(changes.removed, [child.index()]);
        assert!(!changes.geometry.contains(&child.index()));
    }

    #[test]
    fn drain_into_reuses_buffer() {
        let mut store = LayerStore::new();
        let id = store.create_layer();
        let mut changes = store.drain_changes();
        assert_eq!(changes.added, [id.index()]);

        store.set_opacity(id, 0.25);
        store.drain_changes_into(&mut changes);
        assert!(changes.added.is_empty());
        assert_eq!(changes.opacities, [id.index()]);
    }
}
