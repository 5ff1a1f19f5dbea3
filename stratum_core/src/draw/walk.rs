// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The draw-property tree walk.
//!
//! One recursive traversal from the root. On the way down each layer
//! composes its local transform onto what its parent hands it, decides
//! whether it owns a render surface, and narrows the clip. On the way up it
//! computes its drawable and visible rectangles, sizes its surface, and
//! prunes the surface if nothing ends up drawn into it.
//!
//! Two things flow up from every subtree: the union of everything drawn in
//! it (in the current target's space), which sizes surfaces, and the layer
//! list entries appended to the current target.

use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Point, Rect, Vec2};

use crate::geometry::{
    calculate_visible_rect, enclosing_rect, intersect, is_empty, map_clipped_rect, union,
};
use crate::layer::{INVALID, LayerId, LayerStore};
use crate::trace::{
    CalculateBeginEvent, PruneReason, SurfaceCreatedEvent, SurfacePrunedEvent, SurfaceReason,
    Tracer,
};
#[cfg(feature = "trace-rich")]
use crate::trace::{CullReason, LayerCulledEvent};
use crate::transform::Transform3d;

use super::contents_scale::{ContentsScale, resolve_contents_scale};
use super::scroll::compensation_for_children;
use super::sort::{center_depth, sort_back_to_front};
use super::surface::{
    clip_in_surface_space, replica_origin_transform, sublayer_scale, surface_reason,
};
use super::{DrawFrame, DrawInputs, LayerDrawProperties, RenderSurface};

/// Facts about a whole subtree, gathered before the walk.
#[derive(Clone, Copy, Debug, Default)]
struct SubtreeInfo {
    /// Some strict descendant draws content.
    descendant_draws_content: bool,
    /// The layer or a descendant animates its transform or opacity.
    animating: bool,
}

/// State a layer hands to its children.
#[derive(Clone, Copy, Debug)]
struct Inherited {
    /// Accumulated transform into the current target's space.
    parent_matrix: Transform3d,
    /// Current target space to screen space.
    full_hierarchy: Transform3d,
    /// Undoes scrolling since the nearest fixed-position container.
    scroll_compensation: Transform3d,
    /// Clip in target space, meaningful when `clips`.
    clip_rect: Rect,
    clips: bool,
    target: LayerId,
    /// Visible area of the target in target space; `None` when unclipped.
    target_clip: Option<Rect>,
    opacity: f32,
    opacity_animating: bool,
    animating_to_target: bool,
    animating_to_screen: bool,
    ancestor_animating: bool,
    parent_preserves_3d: bool,
}

struct Walk<'a, 't> {
    store: &'a LayerStore,
    inputs: &'a DrawInputs,
    frame: &'a mut DrawFrame,
    tracer: &'a mut Tracer<'t>,
    root: u32,
    subtree: Vec<SubtreeInfo>,
}

impl LayerStore {
    /// Computes draw properties for the tree rooted at `root` into `frame`.
    ///
    /// The frame is cleared first. Layers outside the tree, and subtrees
    /// skipped because they are fully transparent, get no entry.
    ///
    /// # Panics
    ///
    /// Panics if `root` is stale, if its bounds are empty, or if `inputs`
    /// carry a non-finite or non-positive scale factor.
    pub fn calculate_draw_properties(&self, root: LayerId, inputs: &DrawInputs, frame: &mut DrawFrame) {
        self.calculate_draw_properties_traced(root, inputs, frame, &mut Tracer::none());
    }

    /// Like [`calculate_draw_properties`](Self::calculate_draw_properties),
    /// reporting surface decisions to `tracer`.
    pub fn calculate_draw_properties_traced(
        &self,
        root: LayerId,
        inputs: &DrawInputs,
        frame: &mut DrawFrame,
        tracer: &mut Tracer<'_>,
    ) {
        self.validate(root);
        inputs.validate();
        let bounds = self.bounds[root.idx as usize];
        assert!(
            bounds.width > 0.0 && bounds.height > 0.0,
            "root layer bounds must not be empty, got {bounds:?}"
        );

        frame.clear();
        frame.root = Some(root);
        frame.viewport = inputs.viewport_rect();

        tracer.calculate_begin(&CalculateBeginEvent {
            root_index: root.idx,
            layer_count: self.layer_count(),
            viewport_width: inputs.device_viewport_size.width,
            viewport_height: inputs.device_viewport_size.height,
            device_scale_factor: inputs.device_scale_factor,
            page_scale_factor: inputs.page_scale_factor,
        });

        let device = inputs.device_scale_factor;
        let inherited = Inherited {
            parent_matrix: Transform3d::from_scale(device, device, 1.0),
            full_hierarchy: Transform3d::IDENTITY,
            scroll_compensation: Transform3d::IDENTITY,
            clip_rect: Rect::ZERO,
            clips: false,
            target: root,
            target_clip: None,
            opacity: 1.0,
            opacity_animating: false,
            animating_to_target: false,
            animating_to_screen: false,
            ancestor_animating: false,
            parent_preserves_3d: false,
        };

        let mut walk = Walk {
            store: self,
            inputs,
            frame,
            tracer,
            root: root.idx,
            subtree: vec![SubtreeInfo::default(); self.len as usize],
        };
        walk.gather(root.idx);
        // The root owns its list; nothing is appended to this one.
        let mut unused = Vec::new();
        let _ = walk.visit(root.idx, &inherited, &mut unused);

        #[expect(
            clippy::cast_possible_truncation,
            reason = "the surface list holds at most one entry per slot and slots are u32-indexed"
        )]
        let surfaces = walk.frame.render_surface_list.len() as u32;
        walk.frame.stats.surfaces = surfaces;
        let stats = walk.frame.stats;
        walk.tracer.calculate_end(&stats);
    }
}

impl Walk<'_, '_> {
    fn gather(&mut self, idx: u32) -> SubtreeInfo {
        let store = self.store;
        let mut info = SubtreeInfo {
            descendant_draws_content: false,
            animating: store.animation[idx as usize].any(),
        };
        let mut child = store.first_child[idx as usize];
        while child != INVALID {
            let c = self.gather(child);
            info.descendant_draws_content |=
                store.flags[child as usize].draws_content || c.descendant_draws_content;
            info.animating |= c.animating;
            child = store.next_sibling[child as usize];
        }
        self.subtree[idx as usize] = info;
        info
    }

    /// Visits the layer at `idx` and its subtree, appending to `list` (the
    /// layer list of the current target). Returns the subtree's drawable
    /// rectangle in target space.
    fn visit(&mut self, idx: u32, inh: &Inherited, list: &mut Vec<LayerId>) -> Rect {
        let store = self.store;
        let i = idx as usize;
        let Some(id) = store.handle(idx) else {
            return Rect::ZERO;
        };
        let is_root = idx == self.root;
        let flags = store.flags[i];
        let opacity = store.opacity[i];
        let anim = store.animation[i];
        let info = self.subtree[i];
        self.frame.stats.layers_visited += 1;

        if !is_root && opacity == 0.0 && !anim.opacity {
            self.frame.stats.layers_culled += 1;
            #[cfg(feature = "trace-rich")]
            self.tracer.layer_culled(&LayerCulledEvent {
                layer_index: idx,
                reason: CullReason::Transparent,
            });
            return Rect::ZERO;
        }

        // -- Transforms --
        let bounds = store.bounds[i];
        let ratio = store.anchor_point[i];
        let anchor = Vec2::new(ratio.x * bounds.width, ratio.y * bounds.height);
        let anchor_z = store.anchor_point_z[i];
        let scroll_delta = store.scroll_delta[i];
        let origin = store.position[i].to_vec2() - scroll_delta + anchor;
        let local = Transform3d::from_translation(origin.x, origin.y, anchor_z)
            * store.transform[i]
            * Transform3d::from_translation(-anchor.x, -anchor.y, -anchor_z);
        let mut combined = inh.parent_matrix * local;

        let animating_to_target = inh.animating_to_target || anim.transform;
        let animating_to_screen = inh.animating_to_screen || anim.transform;

        let scale = resolve_contents_scale(
            store.contents_scale_mode[i],
            flags.bounds_contain_page_scale,
            &inh.parent_matrix,
            animating_to_screen,
            self.inputs,
        );
        let cs = ContentsScale::for_bounds(bounds, scale);

        if flags.fixed_to_container_layer {
            combined = inh.scroll_compensation * combined;
        }
        let content_to_layer = cs.content_to_layer();
        let draw = combined * content_to_layer;
        let hierarchy = if flags.preserves_3d {
            inh.full_hierarchy
        } else {
            inh.full_hierarchy.flattened_to_2d()
        };
        let screen = hierarchy * draw;

        // -- Surface formation --
        let reason = if is_root {
            Some(SurfaceReason::Root)
        } else {
            surface_reason(
                store,
                idx,
                &combined,
                info.descendant_draws_content,
                inh.parent_preserves_3d,
            )
        };

        let back_facing = if inh.parent_preserves_3d {
            draw.is_back_face_visible()
        } else {
            store.transform[i].is_back_face_visible()
        };
        let back_face_culled = !flags.double_sided
            && back_facing
            && !(animating_to_screen || inh.ancestor_animating || info.animating);

        let mut props = LayerDrawProperties::new(id, inh.target);
        props.content_bounds = cs.content_bounds;
        props.contents_scale_x = cs.x;
        props.contents_scale_y = cs.y;

        let mut next = *inh;
        next.ancestor_animating = inh.ancestor_animating || anim.any();
        next.parent_preserves_3d = flags.preserves_3d;

        let surface_start = self.frame.render_surface_list.len();
        let mut subtree_clips;
        let mut subtree_clip_rect;
        let target_clip;
        let mut sublayer_matrix;

        match reason {
            Some(SurfaceReason::Root) => {
                props.draw_transform = draw;
                props.screen_space_transform = screen;
                props.draw_opacity = opacity;
                props.draw_opacity_is_animating = anim.opacity;
                props.draw_transform_is_animating = animating_to_target;
                props.screen_space_transform_is_animating = animating_to_screen;
                props.render_target = id;

                let viewport = self.frame.viewport;
                let mut rs = RenderSurface::new(id);
                rs.clip_rect = viewport;
                rs.is_clipped = true;
                rs.content_rect = viewport;
                rs.sublayer_scale = Vec2::new(
                    self.inputs.device_scale_factor,
                    self.inputs.device_scale_factor,
                );
                props.render_surface = Some(rs);

                next.target = id;
                next.opacity = props.draw_opacity;
                next.opacity_animating = anim.opacity;
                next.animating_to_target = animating_to_target;
                next.animating_to_screen = animating_to_screen;
                subtree_clips = false;
                subtree_clip_rect = Rect::ZERO;
                target_clip = Some(viewport);
                sublayer_matrix = combined;

                self.frame.render_surface_list.push(id);
                self.tracer.surface_created(&SurfaceCreatedEvent {
                    layer_index: idx,
                    reason: SurfaceReason::Root,
                });
            }
            Some(reason) => {
                let s = sublayer_scale(&combined, self.inputs);
                let to_surface = Transform3d::from_scale(s.x, s.y, 1.0);
                let from_surface = Transform3d::from_scale(1.0 / s.x, 1.0 / s.y, 1.0);

                let mut rs = RenderSurface::new(id);
                rs.draw_transform = combined * from_surface;
                rs.screen_space_transform = hierarchy * rs.draw_transform;
                rs.draw_opacity = inh.opacity * opacity;
                rs.draw_opacity_is_animating = inh.opacity_animating || anim.opacity;
                rs.target_surface_transforms_are_animating = animating_to_target;
                rs.screen_space_transforms_are_animating = animating_to_screen;
                rs.clip_rect = if inh.clips { inh.clip_rect } else { Rect::ZERO };
                rs.is_clipped = inh.clips;
                rs.sublayer_scale = s;
                rs.has_replica = store.replica_layer[i] != INVALID;

                // The owner draws at full opacity into its own surface.
                props.draw_transform = to_surface * content_to_layer;
                props.screen_space_transform = screen;
                props.draw_opacity = 1.0;
                props.draw_opacity_is_animating = false;
                props.draw_transform_is_animating = false;
                props.screen_space_transform_is_animating = animating_to_screen;
                props.render_target = id;

                next.full_hierarchy = inh.full_hierarchy * rs.draw_transform;
                next.target = id;
                next.opacity = 1.0;
                next.opacity_animating = false;
                next.animating_to_target = false;
                next.animating_to_screen = animating_to_screen;
                subtree_clips = false;
                subtree_clip_rect = Rect::ZERO;
                target_clip = clip_in_surface_space(&rs);
                sublayer_matrix = to_surface;

                props.render_surface = Some(rs);
                self.frame.render_surface_list.push(id);
                self.tracer.surface_created(&SurfaceCreatedEvent {
                    layer_index: idx,
                    reason,
                });
            }
            None => {
                props.draw_transform = draw;
                props.screen_space_transform = screen;
                props.draw_opacity = inh.opacity * opacity;
                props.draw_opacity_is_animating = inh.opacity_animating || anim.opacity;
                props.draw_transform_is_animating = animating_to_target;
                props.screen_space_transform_is_animating = animating_to_screen;

                next.opacity = props.draw_opacity;
                next.opacity_animating = props.draw_opacity_is_animating;
                next.animating_to_target = animating_to_target;
                next.animating_to_screen = animating_to_screen;
                subtree_clips = inh.clips;
                subtree_clip_rect = inh.clip_rect;
                target_clip = inh.target_clip;
                sublayer_matrix = combined;
            }
        }
        let owns_surface = props.render_surface.is_some();

        // -- Clip --
        let content_rect = props.content_rect();
        let rect_in_target = enclosing_rect(map_clipped_rect(&props.draw_transform, content_rect));
        let has_mask = store.mask_layer[i] != INVALID;
        if flags.masks_to_bounds || has_mask {
            subtree_clip_rect = if subtree_clips {
                intersect(subtree_clip_rect, rect_in_target)
            } else {
                rect_in_target
            };
            subtree_clips = true;
        }

        // -- Matrix for children --
        if !flags.preserves_3d {
            sublayer_matrix = sublayer_matrix.flattened_to_2d();
        }
        let sublayer_transform = store.sublayer_transform[i];
        if !sublayer_transform.is_identity() {
            let center = Vec2::new(bounds.width * 0.5, bounds.height * 0.5);
            sublayer_matrix = sublayer_matrix
                * Transform3d::from_translation(center.x, center.y, 0.0)
                * sublayer_transform
                * Transform3d::from_translation(-center.x, -center.y, 0.0);
        }
        next.parent_matrix = sublayer_matrix;
        next.clip_rect = subtree_clip_rect;
        next.clips = subtree_clips;
        next.target_clip = target_clip;

        let surface_draw = props
            .render_surface
            .as_ref()
            .filter(|_| !is_root)
            .map(|rs| rs.draw_transform);
        next.scroll_compensation = compensation_for_children(
            flags.is_container_for_fixed_position_layers,
            scroll_delta,
            &inh.parent_matrix,
            surface_draw.as_ref(),
            &inh.scroll_compensation,
        );

        // -- Layer list --
        let mut own_list = Vec::new();
        let list_for_children: &mut Vec<LayerId> = if owns_surface { &mut own_list } else { list };
        let sorting_start = list_for_children.len();

        let draws = flags.draws_content
            && bounds.width > 0.0
            && bounds.height > 0.0
            && !back_face_culled;
        if draws {
            list_for_children.push(id);
            self.frame.stats.layers_drawn += 1;
        } else {
            self.frame.stats.layers_culled += 1;
            #[cfg(feature = "trace-rich")]
            if back_face_culled && flags.draws_content {
                self.tracer.layer_culled(&LayerCulledEvent {
                    layer_index: idx,
                    reason: CullReason::BackFace,
                });
            }
        }

        // -- Children --
        let mut children_rect = Rect::ZERO;
        let mut child = store.first_child[i];
        while child != INVALID {
            let child_rect = self.visit(child, &next, list_for_children);
            children_rect = union(children_rect, child_rect);
            if let Some(child_id) = store.handle(child)
                && self
                    .frame
                    .layer_at(child)
                    .is_some_and(|p| p.render_surface.is_some())
            {
                list_for_children.push(child_id);
            }
            child = store.next_sibling[child as usize];
        }

        // -- Rectangles --
        let mut local_subtree = children_rect;
        if draws {
            local_subtree = union(local_subtree, rect_in_target);
        }
        if subtree_clips {
            local_subtree = intersect(local_subtree, subtree_clip_rect);
        }
        let drawable = if subtree_clips {
            intersect(rect_in_target, subtree_clip_rect)
        } else {
            rect_in_target
        };
        props.drawable_content_rect = drawable;
        props.clip_rect = subtree_clip_rect;
        props.is_clipped = subtree_clips;
        props.visible_content_rect =
            if !flags.draws_content || is_empty(content_rect) || is_empty(drawable) {
                Rect::ZERO
            } else {
                let clip = target_clip.map_or(drawable, |c| intersect(c, drawable));
                calculate_visible_rect(clip, content_rect, &props.draw_transform)
            };

        let added_any = list_for_children.len() > sorting_start;
        if added_any
            && self.inputs.sort_3d_layers
            && flags.preserves_3d
            && !inh.parent_preserves_3d
        {
            let frame = &*self.frame;
            let own = &props;
            sort_back_to_front(&mut list_for_children[sorting_start..], |entry| {
                if entry == id {
                    return center_depth(&own.draw_transform, own.content_rect());
                }
                match frame.layer(entry) {
                    Some(p) => match &p.render_surface {
                        Some(rs) => center_depth(&rs.draw_transform, rs.content_rect),
                        None => center_depth(&p.draw_transform, p.content_rect()),
                    },
                    None => 0.0,
                }
            });
        }

        // -- Surface sizing and pruning --
        let mut prune_reason = None;
        if !is_root && let Some(rs) = props.render_surface.as_mut() {
            let mut clipped = local_subtree;
            if !rs.has_replica
                && !rs.target_surface_transforms_are_animating
                && rs.is_clipped
                && !is_empty(clipped)
            {
                clipped = intersect(
                    clipped,
                    calculate_visible_rect(rs.clip_rect, clipped, &rs.draw_transform),
                );
            }
            let max = f64::from(self.inputs.max_texture_size);
            if !is_empty(clipped) {
                clipped.x1 = clipped.x1.min(clipped.x0 + max);
                clipped.y1 = clipped.y1.min(clipped.y0 + max);
            }
            if is_empty(clipped) {
                clipped = Rect::ZERO;
                if !own_list.is_empty() {
                    own_list.clear();
                    prune_reason = Some(PruneReason::ClippedOut);
                }
            }
            rs.content_rect = clipped;

            let replica = store.replica_layer[i];
            if replica != INVALID {
                let t = replica_origin_transform(store, replica, bounds, rs.sublayer_scale);
                rs.replica_draw_transform = rs.draw_transform * t;
                rs.replica_screen_space_transform = rs.screen_space_transform * t;
            }

            if own_list.is_empty() && !info.animating {
                let reason = prune_reason.unwrap_or(PruneReason::EmptyLayerList);
                self.prune(idx, surface_start, reason, inh);
                props.render_surface = None;
                props.draw_transform = draw;
                props.draw_opacity = inh.opacity * opacity;
                props.draw_opacity_is_animating = inh.opacity_animating || anim.opacity;
                props.draw_transform_is_animating = animating_to_target;
                props.render_target = inh.target;
                props.visible_content_rect = Rect::ZERO;
                *self.frame.slot_mut(idx) = Some(props);
                return Rect::ZERO;
            }
        }

        // -- Commit --
        let result = match props.render_surface.as_mut() {
            Some(rs) => {
                rs.layer_list = own_list;
                if is_root {
                    Rect::ZERO
                } else {
                    enclosing_rect(rs.drawable_content_rect())
                }
            }
            None if added_any => local_subtree,
            None => Rect::ZERO,
        };
        if owns_surface {
            self.write_mask_properties(i, &props);
        }
        *self.frame.slot_mut(idx) = Some(props);
        result
    }

    /// Removes the surface owned by `idx` and every surface formed inside it.
    ///
    /// Descendants that targeted a removed surface are moved over to the
    /// surviving target `inh.target`, with their draw transforms rebased
    /// into its space. They draw nothing, so their rectangles are emptied.
    fn prune(&mut self, idx: u32, surface_start: usize, reason: PruneReason, inh: &Inherited) {
        let removed: Vec<LayerId> = self.frame.render_surface_list.drain(surface_start..).collect();
        for &owner in &removed {
            if owner.idx != idx
                && let Some(p) = self.frame.slot_mut(owner.idx).as_mut()
            {
                p.render_surface = None;
            }
            self.frame.stats.surfaces_pruned += 1;
            self.tracer.surface_pruned(&SurfacePrunedEvent {
                layer_index: owner.idx,
                reason,
            });
        }

        let store = self.store;
        let screen_to_target = inh.full_hierarchy.inverse();
        let mut stack = vec![store.first_child[idx as usize]];
        while let Some(mut n) = stack.pop() {
            while n != INVALID {
                let ni = n as usize;
                stack.push(store.first_child[ni]);
                let replica = store.replica_layer[ni];
                let replica_mask = if replica == INVALID {
                    INVALID
                } else {
                    store.mask_layer[replica as usize]
                };
                for slot in [n, store.mask_layer[ni], replica_mask] {
                    if slot == INVALID {
                        continue;
                    }
                    let Some(p) = self.frame.slot_mut(slot).as_mut() else {
                        continue;
                    };
                    if !removed.contains(&p.render_target) {
                        continue;
                    }
                    p.render_target = inh.target;
                    if let Some(inv) = &screen_to_target {
                        p.draw_transform = *inv * p.screen_space_transform;
                    }
                    p.drawable_content_rect = Rect::ZERO;
                    p.visible_content_rect = Rect::ZERO;
                }
                n = store.next_sibling[ni];
            }
        }
    }

    /// Gives the owner's mask and its replica's mask draw properties that
    /// line them up with the owner's content.
    fn write_mask_properties(&mut self, owner: usize, props: &LayerDrawProperties) {
        let store = self.store;
        let replica = store.replica_layer[owner];
        let replica_mask = if replica == INVALID {
            INVALID
        } else {
            store.mask_layer[replica as usize]
        };
        for mask in [store.mask_layer[owner], replica_mask] {
            let Some(mask_id) = store.handle(mask) else {
                continue;
            };
            let mask_bounds = store.bounds[mask as usize];
            let cs = ContentsScale::for_bounds(mask_bounds, props.contents_scale_x);
            let mut m = LayerDrawProperties::new(mask_id, props.layer);
            m.draw_transform = props.draw_transform;
            m.screen_space_transform = props.screen_space_transform;
            m.content_bounds = cs.content_bounds;
            m.contents_scale_x = cs.x;
            m.contents_scale_y = cs.y;
            m.drawable_content_rect = props.drawable_content_rect;
            m.visible_content_rect = Rect::from_origin_size(Point::ZERO, props.content_bounds);
            *self.frame.slot_mut(mask) = Some(m);
        }
    }
}
