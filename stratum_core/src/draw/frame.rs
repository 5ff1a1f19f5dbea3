// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Output of a draw-property calculation.

use alloc::vec::Vec;

use kurbo::{Rect, Size, Vec2};

use crate::geometry::{map_clipped_rect, union};
use crate::layer::LayerId;
use crate::transform::Transform3d;

/// Draw properties computed for one layer.
///
/// Content space is the layer's raster space: `content_bounds` pixels,
/// which differ from the layout bounds by the contents scale. Target space
/// is the space of the layer's render target surface.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerDrawProperties {
    /// The layer these properties belong to.
    pub layer: LayerId,
    /// Content space to target space.
    pub draw_transform: Transform3d,
    /// Content space to screen (device viewport) space.
    pub screen_space_transform: Transform3d,
    /// Opacity to draw with into the target.
    pub draw_opacity: f32,
    /// Whether `draw_opacity` is not final because an opacity animates.
    pub draw_opacity_is_animating: bool,
    /// Whether `draw_transform` is not final because a transform animates.
    pub draw_transform_is_animating: bool,
    /// Whether `screen_space_transform` is not final because a transform
    /// animates.
    pub screen_space_transform_is_animating: bool,
    /// Bounds of the layer's content in target space, clipped.
    pub drawable_content_rect: Rect,
    /// Part of the content, in content space, that can be visible.
    pub visible_content_rect: Rect,
    /// Clip in target space, meaningful when `is_clipped`.
    pub clip_rect: Rect,
    /// Whether an ancestor or the layer itself clips this layer.
    pub is_clipped: bool,
    /// Raster size of the layer.
    pub content_bounds: Size,
    /// Horizontal contents scale.
    pub contents_scale_x: f64,
    /// Vertical contents scale.
    pub contents_scale_y: f64,
    /// The layer owning the surface this layer draws into. It always owns a
    /// surface in the same frame, also for layers under a pruned surface.
    pub render_target: LayerId,
    /// The surface this layer owns, if any.
    pub render_surface: Option<RenderSurface>,
}

impl LayerDrawProperties {
    pub(crate) fn new(layer: LayerId, render_target: LayerId) -> Self {
        Self {
            layer,
            draw_transform: Transform3d::IDENTITY,
            screen_space_transform: Transform3d::IDENTITY,
            draw_opacity: 1.0,
            draw_opacity_is_animating: false,
            draw_transform_is_animating: false,
            screen_space_transform_is_animating: false,
            drawable_content_rect: Rect::ZERO,
            visible_content_rect: Rect::ZERO,
            clip_rect: Rect::ZERO,
            is_clipped: false,
            content_bounds: Size::ZERO,
            contents_scale_x: 1.0,
            contents_scale_y: 1.0,
            render_target,
            render_surface: None,
        }
    }

    /// The content rectangle `(0, 0, content_bounds)`.
    #[must_use]
    pub fn content_rect(&self) -> Rect {
        Rect::from_origin_size((0.0, 0.0), self.content_bounds)
    }
}

/// An intermediate compositing target owned by a layer.
///
/// The owning layer and its subtree draw into the surface; the surface then
/// draws into its own target as a single textured quad.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSurface {
    /// The layer this surface belongs to.
    pub owning_layer: LayerId,
    /// Surface space to the target surface's space.
    pub draw_transform: Transform3d,
    /// Surface space to screen space.
    pub screen_space_transform: Transform3d,
    /// Surface space to target space, for the reflection.
    pub replica_draw_transform: Transform3d,
    /// Surface space to screen space, for the reflection.
    pub replica_screen_space_transform: Transform3d,
    /// Opacity the surface is composited with.
    pub draw_opacity: f32,
    /// Whether `draw_opacity` is not final.
    pub draw_opacity_is_animating: bool,
    /// Whether the transforms to the target are not final.
    pub target_surface_transforms_are_animating: bool,
    /// Whether the transforms to the screen are not final.
    pub screen_space_transforms_are_animating: bool,
    /// Clip in the target's space, meaningful when `is_clipped`.
    pub clip_rect: Rect,
    /// Whether the surface is clipped when composited.
    pub is_clipped: bool,
    /// Bounds of everything drawn into the surface, in surface space.
    pub content_rect: Rect,
    /// Scale baked into everything drawn into the surface.
    pub sublayer_scale: Vec2,
    /// Whether the owner has a replica.
    pub has_replica: bool,
    /// Layers and contributing surfaces drawn into this surface, back to
    /// front.
    pub layer_list: Vec<LayerId>,
}

impl RenderSurface {
    pub(crate) fn new(owning_layer: LayerId) -> Self {
        Self {
            owning_layer,
            draw_transform: Transform3d::IDENTITY,
            screen_space_transform: Transform3d::IDENTITY,
            replica_draw_transform: Transform3d::IDENTITY,
            replica_screen_space_transform: Transform3d::IDENTITY,
            draw_opacity: 1.0,
            draw_opacity_is_animating: false,
            target_surface_transforms_are_animating: false,
            screen_space_transforms_are_animating: false,
            clip_rect: Rect::ZERO,
            is_clipped: false,
            content_rect: Rect::ZERO,
            sublayer_scale: Vec2::new(1.0, 1.0),
            has_replica: false,
            layer_list: Vec::new(),
        }
    }

    /// Bounds of the surface, and its replica if any, in target space.
    #[must_use]
    pub fn drawable_content_rect(&self) -> Rect {
        let rect = map_clipped_rect(&self.draw_transform, self.content_rect);
        if self.has_replica {
            union(
                rect,
                map_clipped_rect(&self.replica_draw_transform, self.content_rect),
            )
        } else {
            rect
        }
    }
}

/// Counters describing one calculation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Layers the traversal reached.
    pub layers_visited: u32,
    /// Layers added to a layer list.
    pub layers_drawn: u32,
    /// Layers reached but not added to a layer list.
    pub layers_culled: u32,
    /// Surfaces in the final render surface list, root included.
    pub surfaces: u32,
    /// Surfaces formed and then removed.
    pub surfaces_pruned: u32,
}

/// The result of
/// [`calculate_draw_properties`](crate::layer::LayerStore::calculate_draw_properties).
///
/// Per-layer entries are keyed by slot index. Layers the traversal did not
/// reach (other trees, skipped subtrees) have no entry. A frame can be
/// reused across calculations; it is cleared at the start of each one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawFrame {
    pub(crate) layers: Vec<Option<LayerDrawProperties>>,
    pub(crate) render_surface_list: Vec<LayerId>,
    pub(crate) root: Option<LayerId>,
    pub(crate) viewport: Rect,
    pub(crate) stats: DrawStats,
}

impl DrawFrame {
    /// Creates an empty frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all results, keeping allocations.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.render_surface_list.clear();
        self.root = None;
        self.viewport = Rect::ZERO;
        self.stats = DrawStats::default();
    }

    /// The root of the last calculation.
    #[must_use]
    pub fn root(&self) -> Option<LayerId> {
        self.root
    }

    /// The device viewport of the last calculation.
    #[must_use]
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Draw properties of `id`, if the traversal reached it.
    ///
    /// A handle to a since-recycled slot matches nothing.
    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<&LayerDrawProperties> {
        self.layer_at(id.idx).filter(|p| p.layer == id)
    }

    /// Draw properties of every reached layer, in slot order.
    pub fn layers(&self) -> impl Iterator<Item = &LayerDrawProperties> + '_ {
        self.layers.iter().flatten()
    }

    /// Draw properties at raw slot `idx`.
    #[must_use]
    pub fn layer_at(&self, idx: u32) -> Option<&LayerDrawProperties> {
        self.layers.get(idx as usize).and_then(Option::as_ref)
    }

    /// The surface owned by `id`, if any.
    #[must_use]
    pub fn render_surface(&self, id: LayerId) -> Option<&RenderSurface> {
        self.layer(id).and_then(|p| p.render_surface.as_ref())
    }

    /// The layer whose surface `id` draws into.
    #[must_use]
    pub fn render_target(&self, id: LayerId) -> Option<LayerId> {
        self.layer(id).map(|p| p.render_target)
    }

    /// Surface-owning layers in pre-order, root first.
    #[must_use]
    pub fn render_surface_list(&self) -> &[LayerId] {
        &self.render_surface_list
    }

    /// Counters from the last calculation.
    #[must_use]
    pub fn stats(&self) -> DrawStats {
        self.stats
    }

    /// Whether `entry`, found in the layer list of the surface owned by
    /// `target`, stands for a contributing child surface rather than a layer.
    #[must_use]
    pub fn is_contributing_surface(&self, target: LayerId, entry: LayerId) -> bool {
        entry != target && self.render_surface(entry).is_some()
    }

    pub(crate) fn slot_mut(&mut self, idx: u32) -> &mut Option<LayerDrawProperties> {
        let i = idx as usize;
        if self.layers.len() <= i {
            self.layers.resize(i + 1, None);
        }
        &mut self.layers[i]
    }
}
