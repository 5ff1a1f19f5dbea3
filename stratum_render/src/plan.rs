// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: ordered render passes for one computed frame.

use alloc::vec::Vec;

use kurbo::Rect;
use stratum_core::draw::{DrawFrame, LayerDrawProperties, RenderSurface};
use stratum_core::geometry::is_empty;
use stratum_core::layer::{LayerId, LayerStore};
use stratum_core::transform::Transform3d;

/// What a [`RenderItem`] draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// A layer's own content.
    Layer,
    /// A finished child surface.
    Surface,
    /// The reflection of a finished child surface.
    Replica,
}

/// A single textured quad drawn into a pass's target.
///
/// Items are produced in back-to-front order, matching the target's layer
/// list.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderItem {
    /// The layer this item originates from (the owner, for surfaces).
    pub layer_id: LayerId,
    /// What is drawn.
    pub kind: ItemKind,
    /// Source space to the pass's target space.
    pub transform: Transform3d,
    /// Opacity to composite with.
    pub opacity: f32,
    /// Part of the source to draw: the visible content rect of a layer, or
    /// the content rect of a surface.
    pub source_rect: Rect,
    /// Scissor in target space, if any.
    pub clip: Option<Rect>,
    /// Mask layer applied while drawing, if any.
    pub mask: Option<LayerId>,
}

/// Everything drawn into one render surface.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderPass {
    /// The layer owning the target surface.
    pub target: LayerId,
    /// Extent of the target texture, in surface space.
    pub output_rect: Rect,
    /// Draw items in back-to-front order.
    pub items: Vec<RenderItem>,
}

/// Render passes for a single frame, in execution order.
///
/// Every surface is drawn before the surface it contributes to, so the root
/// pass comes last. Backends translate this into native compositor
/// operations or GPU draw calls depending on their rendering strategy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderPlan {
    /// Passes, deepest surfaces first.
    pub passes: Vec<RenderPass>,
}

impl RenderPlan {
    /// Creates an empty render plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the plan for a computed frame.
    #[must_use]
    pub fn build(store: &LayerStore, frame: &DrawFrame) -> Self {
        let mut plan = Self::new();
        plan.rebuild(store, frame);
        plan
    }

    /// Replaces the contents of the plan with the passes for `frame`.
    pub fn rebuild(&mut self, store: &LayerStore, frame: &DrawFrame) {
        self.clear();
        for &target in frame.render_surface_list().iter().rev() {
            let Some(rs) = frame.render_surface(target) else {
                continue;
            };
            let mut items = Vec::with_capacity(rs.layer_list.len());
            for &entry in &rs.layer_list {
                let Some(props) = frame.layer(entry) else {
                    continue;
                };
                if frame.is_contributing_surface(target, entry) {
                    if let Some(child) = &props.render_surface {
                        push_surface(store, entry, child, &mut items);
                    }
                } else {
                    push_layer(props, &mut items);
                }
            }
            self.passes.push(RenderPass {
                target,
                output_rect: rs.content_rect,
                items,
            });
        }
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.passes.clear();
    }

    /// Returns `true` if there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passes.iter().all(|p| p.items.is_empty())
    }

    /// Total number of items across all passes.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.passes.iter().map(|p| p.items.len()).sum()
    }
}

fn push_layer(props: &LayerDrawProperties, items: &mut Vec<RenderItem>) {
    if is_empty(props.visible_content_rect) {
        return;
    }
    items.push(RenderItem {
        layer_id: props.layer,
        kind: ItemKind::Layer,
        transform: props.draw_transform,
        opacity: props.draw_opacity,
        source_rect: props.visible_content_rect,
        clip: props.is_clipped.then_some(props.clip_rect),
        mask: None,
    });
}

fn push_surface(store: &LayerStore, owner: LayerId, rs: &RenderSurface, items: &mut Vec<RenderItem>) {
    if is_empty(rs.content_rect) {
        return;
    }
    let clip = rs.is_clipped.then_some(rs.clip_rect);
    // The reflection sits behind the surface.
    if rs.has_replica {
        let replica_mask = store
            .replica_layer(owner)
            .and_then(|replica| store.mask_layer(replica));
        items.push(RenderItem {
            layer_id: owner,
            kind: ItemKind::Replica,
            transform: rs.replica_draw_transform,
            opacity: rs.draw_opacity,
            source_rect: rs.content_rect,
            clip,
            mask: replica_mask,
        });
    }
    items.push(RenderItem {
        layer_id: owner,
        kind: ItemKind::Surface,
        transform: rs.draw_transform,
        opacity: rs.draw_opacity,
        source_rect: rs.content_rect,
        clip,
        mask: store.mask_layer(owner),
    });
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use kurbo::{Point, Size};
    use stratum_core::draw::DrawInputs;
    use stratum_core::layer::LayerFlags;

    use super::*;

    fn layer(store: &mut LayerStore, size: f64) -> LayerId {
        let id = store.create_layer();
        store.set_bounds(id, Size::new(size, size));
        store.set_flags(id, LayerFlags::drawing());
        id
    }

    fn frame_for(store: &LayerStore, root: LayerId) -> DrawFrame {
        let mut frame = DrawFrame::new();
        store.calculate_draw_properties(root, &DrawInputs::new(Size::new(100.0, 100.0)), &mut frame);
        frame
    }

    #[test]
    fn single_layer_is_one_pass() {
        let mut store = LayerStore::new();
        let root = layer(&mut store, 100.0);
        let plan = RenderPlan::build(&store, &frame_for(&store, root));

        assert_eq!(plan.passes.len(), 1);
        let pass = &plan.passes[0];
        assert_eq!(pass.target, root);
        assert_eq!(pass.output_rect, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(pass.items.len(), 1);
        assert_eq!(pass.items[0].kind, ItemKind::Layer);
        assert_eq!(pass.items[0].source_rect, Rect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn child_surfaces_are_drawn_first() {
        let mut store = LayerStore::new();
        let root = layer(&mut store, 100.0);
        let group = layer(&mut store, 20.0);
        let inner = layer(&mut store, 10.0);
        store.add_child(root, group);
        store.add_child(group, inner);
        store.set_opacity(group, 0.5);

        let plan = RenderPlan::build(&store, &frame_for(&store, root));
        let targets: Vec<_> = plan.passes.iter().map(|p| p.target).collect();
        assert_eq!(targets, [group, root]);

        let group_pass = &plan.passes[0];
        assert!(group_pass.items.iter().all(|i| i.kind == ItemKind::Layer));
        assert_eq!(group_pass.items.len(), 2);

        let root_pass = &plan.passes[1];
        let kinds: Vec<_> = root_pass.items.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, [ItemKind::Layer, ItemKind::Surface]);
        assert_eq!(root_pass.items[1].opacity, 0.5);
        assert_eq!(plan.item_count(), 4);
    }

    #[test]
    fn replica_precedes_its_surface() {
        let mut store = LayerStore::new();
        let root = layer(&mut store, 100.0);
        let owner = layer(&mut store, 20.0);
        store.add_child(root, owner);
        let replica = store.create_layer();
        store.set_position(replica, Point::new(0.0, 20.0));
        let replica_mask = store.create_layer();
        store.set_bounds(replica_mask, Size::new(20.0, 20.0));
        store.set_mask_layer(replica, Some(replica_mask));
        store.set_replica_layer(owner, Some(replica));

        let plan = RenderPlan::build(&store, &frame_for(&store, root));
        let root_pass = plan.passes.last().expect("root pass");
        let kinds: Vec<_> = root_pass.items.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, [ItemKind::Layer, ItemKind::Replica, ItemKind::Surface]);
        assert_eq!(root_pass.items[1].mask, Some(replica_mask));
        assert_eq!(root_pass.items[2].mask, None);
    }

    #[test]
    fn invisible_layers_are_skipped() {
        let mut store = LayerStore::new();
        let root = layer(&mut store, 100.0);
        let offscreen = layer(&mut store, 10.0);
        store.set_position(offscreen, Point::new(200.0, 200.0));
        store.add_child(root, offscreen);

        let plan = RenderPlan::build(&store, &frame_for(&store, root));
        assert_eq!(plan.item_count(), 1);
        assert!(!plan.is_empty());
        assert!(RenderPlan::new().is_empty());
    }
}
