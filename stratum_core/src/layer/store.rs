// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays layer storage with allocation, topology, and property management.

use alloc::vec::Vec;

use kurbo::{Point, Size, Vec2};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::draw::ContentsScaleMode;
use crate::transform::Transform3d;

use super::id::{INVALID, LayerId};
use super::traverse::Children;
use crate::dirty;

/// Per-layer boolean flags.
///
/// The default has every flag cleared except [`double_sided`](Self::double_sided).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerFlags {
    /// Whether the layer paints content of its own.
    pub draws_content: bool,
    /// Whether the layer clips its descendants to its bounds.
    pub masks_to_bounds: bool,
    /// Whether descendants share this layer's 3D space instead of being
    /// flattened into its plane.
    pub preserves_3d: bool,
    /// Whether the back face of the layer is drawn.
    pub double_sided: bool,
    /// Forces a render surface regardless of other triggers.
    pub force_render_surface: bool,
    /// Fixed-position descendants are fixed relative to this layer.
    pub is_container_for_fixed_position_layers: bool,
    /// The layer does not move with the scroll deltas between it and its
    /// fixed-position container.
    pub fixed_to_container_layer: bool,
    /// The layer's bounds already include the page scale, so the page scale
    /// is not applied to its contents scale again.
    pub bounds_contain_page_scale: bool,
}

impl LayerFlags {
    /// Default flags.
    pub const DEFAULT: Self = Self {
        draws_content: false,
        masks_to_bounds: false,
        preserves_3d: false,
        double_sided: true,
        force_render_surface: false,
        is_container_for_fixed_position_layers: false,
        fixed_to_container_layer: false,
        bounds_contain_page_scale: false,
    };

    /// Default flags with [`draws_content`](Self::draws_content) set.
    #[must_use]
    pub const fn drawing() -> Self {
        Self {
            draws_content: true,
            ..Self::DEFAULT
        }
    }
}

impl Default for LayerFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Which properties of a layer are being driven by an animation.
///
/// The engine never interpolates; it only needs to know that the current
/// value is not final, which suppresses culling decisions that depend on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LayerAnimation {
    /// The layer's transform is animating.
    pub transform: bool,
    /// The layer's opacity is animating.
    pub opacity: bool,
}

impl LayerAnimation {
    /// Returns whether any property is animating.
    #[must_use]
    pub const fn any(self) -> bool {
        self.transform || self.opacity
    }
}

/// Struct-of-arrays storage for all layers.
///
/// Layers are addressed by [`LayerId`] handles. Internally, each layer occupies
/// a slot in parallel arrays. Destroyed layers are recycled via a free list,
/// and generation counters prevent stale handle access.
#[derive(Debug)]
pub struct LayerStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Local properties (set by callers) --
    pub(crate) transform: Vec<Transform3d>,
    pub(crate) sublayer_transform: Vec<Transform3d>,
    pub(crate) anchor_point: Vec<Point>,
    pub(crate) anchor_point_z: Vec<f64>,
    pub(crate) position: Vec<Point>,
    pub(crate) bounds: Vec<Size>,
    pub(crate) opacity: Vec<f32>,
    pub(crate) flags: Vec<LayerFlags>,
    pub(crate) contents_scale_mode: Vec<ContentsScaleMode>,
    pub(crate) scroll_delta: Vec<Vec2>,
    pub(crate) animation: Vec<LayerAnimation>,

    // -- Attachments (non-owning) --
    pub(crate) mask_layer: Vec<u32>,
    pub(crate) replica_layer: Vec<u32>,
    /// Owner of a layer used as a mask or replica, or `INVALID`.
    pub(crate) attached_to: Vec<u32>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,
    pub(crate) topology_dirty: bool,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerStore {
    /// Creates an empty layer store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            transform: Vec::new(),
            sublayer_transform: Vec::new(),
            anchor_point: Vec::new(),
            anchor_point_z: Vec::new(),
            position: Vec::new(),
            bounds: Vec::new(),
            opacity: Vec::new(),
            flags: Vec::new(),
            contents_scale_mode: Vec::new(),
            scroll_delta: Vec::new(),
            animation: Vec::new(),
            mask_layer: Vec::new(),
            replica_layer: Vec::new(),
            attached_to: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            topology_dirty: true,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
        }
    }

    /// The anchor point new layers start with: the center of their bounds.
    pub const DEFAULT_ANCHOR_POINT: Point = Point::new(0.5, 0.5);

    // -- Allocation API --

    /// Creates a new layer and returns its handle.
    ///
    /// The layer starts with identity transforms, a centered anchor point,
    /// zero position and bounds, full opacity, [default flags](LayerFlags),
    /// automatic contents scale, and no parent.
    pub fn create_layer(&mut self) -> LayerId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot. The generation was bumped on destroy.
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.transform[i] = Transform3d::IDENTITY;
            self.sublayer_transform[i] = Transform3d::IDENTITY;
            self.anchor_point[i] = Self::DEFAULT_ANCHOR_POINT;
            self.anchor_point_z[i] = 0.0;
            self.position[i] = Point::ZERO;
            self.bounds[i] = Size::ZERO;
            self.opacity[i] = 1.0;
            self.flags[i] = LayerFlags::DEFAULT;
            self.contents_scale_mode[i] = ContentsScaleMode::Automatic;
            self.scroll_delta[i] = Vec2::ZERO;
            self.animation[i] = LayerAnimation::default();
            self.mask_layer[i] = INVALID;
            self.replica_layer[i] = INVALID;
            self.attached_to[i] = INVALID;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.transform.push(Transform3d::IDENTITY);
            self.sublayer_transform.push(Transform3d::IDENTITY);
            self.anchor_point.push(Self::DEFAULT_ANCHOR_POINT);
            self.anchor_point_z.push(0.0);
            self.position.push(Point::ZERO);
            self.bounds.push(Size::ZERO);
            self.opacity.push(1.0);
            self.flags.push(LayerFlags::DEFAULT);
            self.contents_scale_mode.push(ContentsScaleMode::Automatic);
            self.scroll_delta.push(Vec2::ZERO);
            self.animation.push(LayerAnimation::default());
            self.mask_layer.push(INVALID);
            self.replica_layer.push(INVALID);
            self.attached_to.push(INVALID);
            self.generation.push(0);
            idx
        };

        self.topology_dirty = true;
        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);

        LayerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a layer, freeing its slot for reuse.
    ///
    /// Any mask or replica attached to the layer is detached.
    ///
    /// # Panics
    ///
    /// Panics if the layer has children (remove them first), if it is
    /// attached to another layer as a mask or replica, or if the handle is
    /// stale.
    pub fn destroy_layer(&mut self, id: LayerId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy layer with children"
        );
        assert!(
            self.attached_to[idx as usize] == INVALID,
            "cannot destroy layer attached as a mask or replica"
        );

        if self.parent[idx as usize] != INVALID {
            self.unlink_from_parent(idx);
        }
        for attachment in [self.mask_layer[idx as usize], self.replica_layer[idx as usize]] {
            if attachment != INVALID {
                self.attached_to[attachment as usize] = INVALID;
            }
        }
        self.mask_layer[idx as usize] = INVALID;
        self.replica_layer[idx as usize] = INVALID;

        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;

        self.free_list.push(idx);
        self.topology_dirty = true;
        self.pending_removed.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: LayerId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Returns the number of slots ever allocated, live or free.
    ///
    /// Every live layer's [`index`](LayerId::index) is below this value.
    #[must_use]
    pub fn slot_count(&self) -> u32 {
        self.len
    }

    /// Returns the number of live layers.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the free list never holds more than `len` entries"
    )]
    pub fn layer_count(&self) -> u32 {
        self.len - self.free_list.len() as u32
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// Marks inherited channels for `child`'s subtree so its geometry and
    /// opacity are reported as changed under the new ancestry.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent or
    /// is attached as a mask or replica, or if `parent` is `child` or one of
    /// its descendants.
    pub fn add_child(&mut self, parent: LayerId, child: LayerId) {
        self.validate(parent);
        self.validate(child);
        assert!(
            self.parent[child.idx as usize] == INVALID,
            "child already has a parent"
        );
        self.assert_can_link(parent.idx, child.idx);
        self.link_last_child(parent.idx, child.idx);
    }

    /// Removes `child` from its current parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer has no parent.
    pub fn remove_from_parent(&mut self, child: LayerId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "layer has no parent");

        let p = self.parent[c as usize];
        self.unlink_from_parent(c);
        self.dirty.remove_dependency(c, p, dirty::GEOMETRY);
        self.dirty.remove_dependency(c, p, dirty::OPACITY);

        self.mark_subtree_inherited_dirty(c);
        self.topology_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Moves `child` to be the last child of `new_parent`.
    ///
    /// If `child` already has a parent, it is removed first.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` is attached as a mask or
    /// replica, or if `new_parent` is `child` or one of its descendants.
    pub fn reparent(&mut self, child: LayerId, new_parent: LayerId) {
        self.validate(child);
        self.validate(new_parent);

        let c = child.idx;
        self.assert_can_link(new_parent.idx, c);
        if self.parent[c as usize] != INVALID {
            let old_p = self.parent[c as usize];
            self.unlink_from_parent(c);
            self.dirty.remove_dependency(c, old_p, dirty::GEOMETRY);
            self.dirty.remove_dependency(c, old_p, dirty::OPACITY);
            self.dirty.mark(old_p, dirty::TOPOLOGY);
        }
        self.link_last_child(new_parent.idx, c);
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// `child` must not already have a parent. `sibling` must have a parent.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, `sibling`
    /// has no parent, `child` is attached as a mask or replica, or `sibling`'s
    /// parent lies inside `child`'s subtree.
    pub fn insert_before(&mut self, child: LayerId, sibling: LayerId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");
        self.assert_can_link(p, c);

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            // `sibling` was the first child.
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        let _ = self.dirty.add_dependency(c, p, dirty::GEOMETRY);
        let _ = self.dirty.add_dependency(c, p, dirty::OPACITY);

        self.mark_subtree_inherited_dirty(c);
        self.topology_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Returns the parent of a layer, if any.
    #[must_use]
    pub fn parent(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        self.handle(self.parent[id.idx as usize])
    }

    /// Returns an iterator over the direct children of a layer, back to front.
    #[must_use]
    pub fn children(&self, id: LayerId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the root layers (those with no parent), excluding layers
    /// attached as a mask or replica.
    #[must_use]
    pub fn roots(&self) -> Vec<LayerId> {
        let mut roots = Vec::new();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID
                && self.attached_to[idx as usize] == INVALID
                && !self.free_list.contains(&idx)
            {
                roots.push(LayerId {
                    idx,
                    generation: self.generation[idx as usize],
                });
            }
        }
        roots
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the local transform of a layer.
    #[must_use]
    pub fn transform(&self, id: LayerId) -> Transform3d {
        self.validate(id);
        self.transform[id.idx as usize]
    }

    /// Returns the transform applied to the layer's children.
    #[must_use]
    pub fn sublayer_transform(&self, id: LayerId) -> Transform3d {
        self.validate(id);
        self.sublayer_transform[id.idx as usize]
    }

    /// Returns the anchor point, as a fraction of the bounds.
    #[must_use]
    pub fn anchor_point(&self, id: LayerId) -> Point {
        self.validate(id);
        self.anchor_point[id.idx as usize]
    }

    /// Returns the z coordinate of the anchor point.
    #[must_use]
    pub fn anchor_point_z(&self, id: LayerId) -> f64 {
        self.validate(id);
        self.anchor_point_z[id.idx as usize]
    }

    /// Returns the position of the anchor point in the parent's space.
    #[must_use]
    pub fn position(&self, id: LayerId) -> Point {
        self.validate(id);
        self.position[id.idx as usize]
    }

    /// Returns the layout bounds.
    #[must_use]
    pub fn bounds(&self, id: LayerId) -> Size {
        self.validate(id);
        self.bounds[id.idx as usize]
    }

    /// Returns the local opacity.
    #[must_use]
    pub fn opacity(&self, id: LayerId) -> f32 {
        self.validate(id);
        self.opacity[id.idx as usize]
    }

    /// Returns the flags of a layer.
    #[must_use]
    pub fn flags(&self, id: LayerId) -> LayerFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Returns the contents scale mode.
    #[must_use]
    pub fn contents_scale_mode(&self, id: LayerId) -> ContentsScaleMode {
        self.validate(id);
        self.contents_scale_mode[id.idx as usize]
    }

    /// Returns the scroll delta.
    #[must_use]
    pub fn scroll_delta(&self, id: LayerId) -> Vec2 {
        self.validate(id);
        self.scroll_delta[id.idx as usize]
    }

    /// Returns the animation state.
    #[must_use]
    pub fn animation(&self, id: LayerId) -> LayerAnimation {
        self.validate(id);
        self.animation[id.idx as usize]
    }

    /// Returns the mask layer, if any.
    #[must_use]
    pub fn mask_layer(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        self.handle(self.mask_layer[id.idx as usize])
    }

    /// Returns the replica layer, if any.
    #[must_use]
    pub fn replica_layer(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        self.handle(self.replica_layer[id.idx as usize])
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets the local transform, applied about the anchor point.
    pub fn set_transform(&mut self, id: LayerId, transform: Transform3d) {
        self.validate(id);
        self.transform[id.idx as usize] = transform;
        self.mark_geometry(id.idx);
    }

    /// Sets the transform applied to the layer's children, about the center
    /// of its bounds.
    pub fn set_sublayer_transform(&mut self, id: LayerId, transform: Transform3d) {
        self.validate(id);
        self.sublayer_transform[id.idx as usize] = transform;
        self.mark_geometry(id.idx);
    }

    /// Sets the anchor point as a fraction of the bounds.
    pub fn set_anchor_point(&mut self, id: LayerId, anchor: Point) {
        self.validate(id);
        self.anchor_point[id.idx as usize] = anchor;
        self.mark_geometry(id.idx);
    }

    /// Sets the z coordinate of the anchor point.
    pub fn set_anchor_point_z(&mut self, id: LayerId, z: f64) {
        self.validate(id);
        self.anchor_point_z[id.idx as usize] = z;
        self.mark_geometry(id.idx);
    }

    /// Sets the position of the anchor point in the parent's space.
    pub fn set_position(&mut self, id: LayerId, position: Point) {
        self.validate(id);
        self.position[id.idx as usize] = position;
        self.mark_geometry(id.idx);
    }

    /// Sets the layout bounds.
    pub fn set_bounds(&mut self, id: LayerId, bounds: Size) {
        self.validate(id);
        self.bounds[id.idx as usize] = bounds;
        self.mark_geometry(id.idx);
    }

    /// Sets the local opacity.
    ///
    /// Marks the OPACITY channel dirty with eager propagation to descendants.
    pub fn set_opacity(&mut self, id: LayerId, opacity: f32) {
        self.validate(id);
        self.opacity[id.idx as usize] = opacity;
        self.dirty.mark_with(id.idx, dirty::OPACITY, &EagerPolicy);
    }

    /// Sets the flags of a layer.
    pub fn set_flags(&mut self, id: LayerId, flags: LayerFlags) {
        self.validate(id);
        let old = self.flags[id.idx as usize];
        self.flags[id.idx as usize] = flags;
        if old.draws_content != flags.draws_content {
            self.dirty.mark(id.idx, dirty::CONTENT);
        }
        // Every other flag feeds surface formation, clipping, or transforms.
        self.mark_geometry(id.idx);
    }

    /// Sets how the layer's contents scale is chosen.
    ///
    /// # Panics
    ///
    /// Panics if a fixed scale is not finite and positive.
    pub fn set_contents_scale_mode(&mut self, id: LayerId, mode: ContentsScaleMode) {
        self.validate(id);
        if let ContentsScaleMode::Fixed(scale) = mode {
            assert!(
                scale.is_finite() && scale > 0.0,
                "contents scale must be finite and positive, got {scale}"
            );
        }
        self.contents_scale_mode[id.idx as usize] = mode;
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Sets the offset the layer's content is scrolled by.
    pub fn set_scroll_delta(&mut self, id: LayerId, delta: Vec2) {
        self.validate(id);
        self.scroll_delta[id.idx as usize] = delta;
        self.mark_geometry(id.idx);
    }

    /// Sets which properties of the layer are animating.
    pub fn set_animation(&mut self, id: LayerId, animation: LayerAnimation) {
        self.validate(id);
        self.animation[id.idx as usize] = animation;
        self.mark_geometry(id.idx);
    }

    /// Attaches `mask` as the mask layer of `owner`, or detaches the current
    /// mask with `None`.
    ///
    /// A mask layer is not a child; it is referenced by its owner only.
    ///
    /// # Panics
    ///
    /// Panics if a handle is stale, if `mask` is `owner`, or if `mask` has a
    /// parent or is already attached to another layer.
    pub fn set_mask_layer(&mut self, owner: LayerId, mask: Option<LayerId>) {
        self.validate(owner);
        let old = self.mask_layer[owner.idx as usize];
        let new = self.attach(owner, mask);
        if old != INVALID && old != new {
            self.attached_to[old as usize] = INVALID;
        }
        self.mask_layer[owner.idx as usize] = new;
        self.mark_attachment_changed(owner.idx);
    }

    /// Attaches `replica` as the replica layer of `owner`, or detaches the
    /// current replica with `None`.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`set_mask_layer`](Self::set_mask_layer).
    pub fn set_replica_layer(&mut self, owner: LayerId, replica: Option<LayerId>) {
        self.validate(owner);
        let old = self.replica_layer[owner.idx as usize];
        let new = self.attach(owner, replica);
        if old != INVALID && old != new {
            self.attached_to[old as usize] = INVALID;
        }
        self.replica_layer[owner.idx as usize] = new;
        self.mark_attachment_changed(owner.idx);
    }

    // -- Raw-index accessors --
    //
    // These accept raw slot indices (as found in `FrameChanges` or a
    // `DrawFrame`) rather than `LayerId` handles, skipping generation
    // validation.

    /// Returns the flags at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn flags_at(&self, idx: u32) -> LayerFlags {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.flags[idx as usize]
    }

    /// Returns the mask layer slot at raw slot `idx`, or [`INVALID`].
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn mask_layer_at(&self, idx: u32) -> u32 {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.mask_layer[idx as usize]
    }

    /// Returns the replica layer slot at raw slot `idx`, or [`INVALID`].
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn replica_layer_at(&self, idx: u32) -> u32 {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.replica_layer[idx as usize]
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: LayerId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale LayerId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Returns the live handle for a raw slot, or `None` for [`INVALID`].
    pub(crate) fn handle(&self, idx: u32) -> Option<LayerId> {
        (idx != INVALID).then(|| LayerId {
            idx,
            generation: self.generation[idx as usize],
        })
    }

    /// Checks that making `c` a child of `p` keeps the tree a tree and
    /// leaves attachments with a single owner.
    fn assert_can_link(&self, p: u32, c: u32) {
        assert!(
            self.attached_to[c as usize] == INVALID,
            "mask and replica layers cannot have a parent"
        );
        let mut n = p;
        while n != INVALID {
            assert!(n != c, "linking would create a cycle");
            n = self.parent[n as usize];
        }
    }

    fn link_last_child(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        // Child depends on parent for GEOMETRY and OPACITY.
        let _ = self.dirty.add_dependency(c, p, dirty::GEOMETRY);
        let _ = self.dirty.add_dependency(c, p, dirty::OPACITY);

        self.mark_subtree_inherited_dirty(c);
        self.topology_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Validates and records an attachment, returning its raw slot.
    fn attach(&mut self, owner: LayerId, layer: Option<LayerId>) -> u32 {
        let Some(layer) = layer else {
            return INVALID;
        };
        self.validate(layer);
        let l = layer.idx as usize;
        assert!(layer != owner, "a layer cannot be attached to itself");
        assert!(
            self.parent[l] == INVALID,
            "mask and replica layers cannot have a parent"
        );
        assert!(
            self.attached_to[l] == INVALID || self.attached_to[l] == owner.idx,
            "layer is already attached as a mask or replica"
        );
        self.attached_to[l] = owner.idx;
        layer.idx
    }

    fn mark_attachment_changed(&mut self, idx: u32) {
        self.dirty.mark(idx, dirty::CONTENT);
        self.mark_geometry(idx);
        self.topology_dirty = true;
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    fn mark_geometry(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::GEOMETRY, &EagerPolicy);
    }

    /// Marks the subtree rooted at `idx` dirty for inherited channels.
    fn mark_subtree_inherited_dirty(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::GEOMETRY, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::OPACITY, &EagerPolicy);
    }
}
