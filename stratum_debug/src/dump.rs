// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON dump of a computed frame.
//!
//! [`frame_to_json`] turns a [`DrawFrame`] into a [`serde_json::Value`] for
//! inspection or golden-file comparison; [`write_frame`] pretty-prints it.
//! Matrices are written column by column, rectangles as `[x0, y0, x1, y1]`.

use std::io::{self, Write};

use kurbo::Rect;
use serde_json::{Value, json};

use stratum_core::draw::{DrawFrame, LayerDrawProperties, RenderSurface};
use stratum_core::layer::LayerId;
use stratum_core::transform::Transform3d;

/// Builds a JSON description of `frame`.
#[must_use]
pub fn frame_to_json(frame: &DrawFrame) -> Value {
    let stats = frame.stats();
    json!({
        "root": frame.root().map(id),
        "viewport": rect(frame.viewport()),
        "render_surface_list": frame.render_surface_list().iter().map(|&l| id(l)).collect::<Vec<_>>(),
        "stats": {
            "layers_visited": stats.layers_visited,
            "layers_drawn": stats.layers_drawn,
            "layers_culled": stats.layers_culled,
            "surfaces": stats.surfaces,
            "surfaces_pruned": stats.surfaces_pruned,
        },
        "layers": frame.layers().map(layer).collect::<Vec<_>>(),
    })
}

/// Writes the pretty-printed JSON description of `frame` to `writer`.
pub fn write_frame(frame: &DrawFrame, writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &frame_to_json(frame))?;
    writeln!(writer)
}

fn id(l: LayerId) -> Value {
    json!(l.index())
}

fn rect(r: Rect) -> Value {
    json!([r.x0, r.y0, r.x1, r.y1])
}

fn matrix(t: &Transform3d) -> Value {
    json!(t.cols)
}

fn layer(p: &LayerDrawProperties) -> Value {
    let mut v = json!({
        "layer": id(p.layer),
        "render_target": id(p.render_target),
        "draw_transform": matrix(&p.draw_transform),
        "screen_space_transform": matrix(&p.screen_space_transform),
        "draw_opacity": p.draw_opacity,
        "drawable_content_rect": rect(p.drawable_content_rect),
        "visible_content_rect": rect(p.visible_content_rect),
        "clip_rect": p.is_clipped.then(|| rect(p.clip_rect)),
        "content_bounds": [p.content_bounds.width, p.content_bounds.height],
        "contents_scale": [p.contents_scale_x, p.contents_scale_y],
    });
    if let Some(rs) = &p.render_surface {
        v["render_surface"] = surface(rs);
    }
    v
}

fn surface(rs: &RenderSurface) -> Value {
    let mut v = json!({
        "draw_transform": matrix(&rs.draw_transform),
        "screen_space_transform": matrix(&rs.screen_space_transform),
        "draw_opacity": rs.draw_opacity,
        "content_rect": rect(rs.content_rect),
        "clip_rect": rs.is_clipped.then(|| rect(rs.clip_rect)),
        "sublayer_scale": [rs.sublayer_scale.x, rs.sublayer_scale.y],
        "layer_list": rs.layer_list.iter().map(|&l| id(l)).collect::<Vec<_>>(),
    });
    if rs.has_replica {
        v["replica_draw_transform"] = matrix(&rs.replica_draw_transform);
    }
    v
}

#[cfg(test)]
mod tests {
    use kurbo::Size;
    use stratum_core::draw::DrawInputs;
    use stratum_core::layer::{LayerFlags, LayerStore};

    use super::*;

    fn sample() -> (LayerStore, DrawFrame) {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        store.set_bounds(root, Size::new(100.0, 50.0));
        store.set_flags(root, LayerFlags::drawing());
        let group = store.create_layer();
        store.set_bounds(group, Size::new(10.0, 10.0));
        store.set_flags(group, LayerFlags::drawing());
        store.set_opacity(group, 0.5);
        let inner = store.create_layer();
        store.set_bounds(inner, Size::new(10.0, 10.0));
        store.set_flags(inner, LayerFlags::drawing());
        store.add_child(root, group);
        store.add_child(group, inner);

        let mut frame = DrawFrame::new();
        store.calculate_draw_properties(root, &DrawInputs::new(Size::new(100.0, 50.0)), &mut frame);
        (store, frame)
    }

    #[test]
    fn frame_summary_fields() {
        let (_store, frame) = sample();
        let v = frame_to_json(&frame);
        assert_eq!(v["root"], 0);
        assert_eq!(v["viewport"], json!([0.0, 0.0, 100.0, 50.0]));
        assert_eq!(v["render_surface_list"], json!([0, 1]));
        assert_eq!(v["stats"]["surfaces"], 2);
        assert_eq!(v["layers"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn surfaces_are_nested_in_their_owner() {
        let (_store, frame) = sample();
        let v = frame_to_json(&frame);
        let group = &v["layers"][1];
        assert_eq!(group["layer"], 1);
        assert_eq!(group["render_surface"]["draw_opacity"], 0.5);
        assert_eq!(group["render_surface"]["layer_list"], json!([1, 2]));
        assert!(v["layers"][2]["render_surface"].is_null());
        assert_eq!(v["layers"][2]["render_target"], 1);
    }

    #[test]
    fn written_dump_parses_back() {
        let (_store, frame) = sample();
        let mut out = Vec::new();
        write_frame(&frame, &mut out).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, frame_to_json(&frame));
    }

    #[test]
    fn empty_frame_has_no_root() {
        let v = frame_to_json(&DrawFrame::new());
        assert!(v["root"].is_null());
        assert_eq!(v["layers"], json!([]));
    }
}
