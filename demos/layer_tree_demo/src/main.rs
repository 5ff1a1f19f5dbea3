// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Builds a small page-like layer tree and runs the draw-properties
//! pipeline over it.
//!
//! Every calculation is traced to both a
//! [`PrettyPrintSink`](stratum_debug::pretty::PrettyPrintSink) on stderr and a
//! [`RecorderSink`](stratum_debug::recorder::RecorderSink). The first frame is
//! dumped as JSON on stdout, followed by the render plan, a few scrolled
//! frames with their damage, hit-test results, and a summary of the
//! recording.

use std::io::{self, Write};

use kurbo::{Point, Size, Vec2};
use stratum_core::draw::{DrawFrame, DrawInputs, DrawStats, find_layer_hit_by_point};
use stratum_core::layer::{LayerFlags, LayerId, LayerStore};
use stratum_core::trace::{
    CalculateBeginEvent, DamageRect, LayerCulledEvent, SurfaceCreatedEvent, SurfacePrunedEvent,
    TraceSink, Tracer,
};
use stratum_core::transform::Transform3d;
use stratum_debug::dump::write_frame;
use stratum_debug::pretty::PrettyPrintSink;
use stratum_debug::recorder::{RecordedEvent, RecorderSink, decode};
use stratum_render::{DamageRegion, DamageTracker, RenderPlan};

const VIEWPORT: Size = Size::new(800.0, 600.0);
const SCROLL_FRAMES: u32 = 3;

/// Forwards every event to two sinks.
struct Tee<'a> {
    a: &'a mut dyn TraceSink,
    b: &'a mut dyn TraceSink,
}

impl TraceSink for Tee<'_> {
    fn on_calculate_begin(&mut self, e: &CalculateBeginEvent) {
        self.a.on_calculate_begin(e);
        self.b.on_calculate_begin(e);
    }

    fn on_surface_created(&mut self, e: &SurfaceCreatedEvent) {
        self.a.on_surface_created(e);
        self.b.on_surface_created(e);
    }

    fn on_surface_pruned(&mut self, e: &SurfacePrunedEvent) {
        self.a.on_surface_pruned(e);
        self.b.on_surface_pruned(e);
    }

    fn on_calculate_end(&mut self, stats: &DrawStats) {
        self.a.on_calculate_end(stats);
        self.b.on_calculate_end(stats);
    }

    fn on_layer_culled(&mut self, e: &LayerCulledEvent) {
        self.a.on_layer_culled(e);
        self.b.on_layer_culled(e);
    }

    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        self.a.on_damage_rects(frame_index, rects);
        self.b.on_damage_rects(frame_index, rects);
    }
}

/// Handles to the interesting layers of the demo page.
struct Page {
    root: LayerId,
    scroller: LayerId,
    header: LayerId,
    card: LayerId,
    flipped: LayerId,
}

fn drawing_layer(store: &mut LayerStore, parent: LayerId, origin: Point, size: Size) -> LayerId {
    let id = store.create_layer();
    store.set_position(id, origin);
    store.set_bounds(id, size);
    store.set_flags(id, LayerFlags::drawing());
    store.add_child(parent, id);
    id
}

// root
// └── scroller (clips, fixed-position container)
//     ├── header (fixed)
//     ├── card (translucent group, rotated)
//     │   ├── title
//     │   └── body
//     ├── flipped (facing away, culled)
//     └── hidden (opacity 0, skipped)
fn build_page(store: &mut LayerStore) -> Page {
    let root = store.create_layer();
    store.set_bounds(root, VIEWPORT);
    store.set_flags(root, LayerFlags::drawing());

    let scroller = drawing_layer(store, root, Point::ZERO, Size::new(800.0, 2000.0));
    store.set_flags(
        scroller,
        LayerFlags {
            masks_to_bounds: true,
            is_container_for_fixed_position_layers: true,
            ..LayerFlags::drawing()
        },
    );

    let header = drawing_layer(store, scroller, Point::ZERO, Size::new(800.0, 60.0));
    store.set_flags(
        header,
        LayerFlags {
            fixed_to_container_layer: true,
            ..LayerFlags::drawing()
        },
    );

    let card = drawing_layer(store, scroller, Point::new(100.0, 120.0), Size::new(300.0, 200.0));
    store.set_opacity(card, 0.8);
    store.set_transform(card, Transform3d::from_rotation_z(0.1));
    drawing_layer(store, card, Point::new(10.0, 10.0), Size::new(280.0, 40.0));
    drawing_layer(store, card, Point::new(10.0, 60.0), Size::new(280.0, 130.0));

    let flipped = drawing_layer(store, scroller, Point::new(450.0, 120.0), Size::new(200.0, 200.0));
    store.set_transform(flipped, Transform3d::from_rotation_y(std::f64::consts::PI));
    store.set_flags(
        flipped,
        LayerFlags {
            double_sided: false,
            ..LayerFlags::drawing()
        },
    );

    let hidden = drawing_layer(store, scroller, Point::new(0.0, 400.0), Size::new(100.0, 100.0));
    store.set_opacity(hidden, 0.0);

    Page {
        root,
        scroller,
        header,
        card,
        flipped,
    }
}

fn describe_damage(damage: &DamageRegion) -> String {
    match damage {
        DamageRegion::Full => "full".into(),
        DamageRegion::None => "none".into(),
        DamageRegion::Rects(rects) => format!("{} rect(s)", rects.len()),
    }
}

fn main() -> io::Result<()> {
    let mut store = LayerStore::new();
    let page = build_page(&mut store);
    let inputs = DrawInputs::new(VIEWPORT).with_device_scale_factor(1.0);

    let mut pretty = PrettyPrintSink::stderr();
    let mut recorder = RecorderSink::new();
    let mut frame = DrawFrame::new();
    let mut tracker = DamageTracker::new();
    let mut plan = RenderPlan::new();
    let mut out = io::stdout().lock();

    for step in 0..=SCROLL_FRAMES {
        let scroll = Vec2::new(0.0, f64::from(step) * 40.0);
        store.set_scroll_delta(page.scroller, scroll);
        let changes = store.drain_changes();

        let mut tee = Tee {
            a: &mut pretty,
            b: &mut recorder,
        };
        let mut tracer = Tracer::new(&mut tee);
        store.calculate_draw_properties_traced(page.root, &inputs, &mut frame, &mut tracer);
        let damage = tracker.update_traced(&frame, &changes, &mut tracer);
        plan.rebuild(&store, &frame);

        if step == 0 {
            writeln!(out, "== frame dump ==")?;
            write_frame(&frame, &mut out)?;
            writeln!(out, "== render plan ==")?;
            for pass in &plan.passes {
                writeln!(out, "pass {:?}: {} item(s)", pass.target, pass.items.len())?;
                for item in &pass.items {
                    writeln!(
                        out,
                        "  {:?} {:?} opacity={} mask={:?}",
                        item.kind, item.layer_id, item.opacity, item.mask
                    )?;
                }
            }
        }
        writeln!(
            out,
            "scroll={:>5.1} surfaces={} items={} damage={}",
            scroll.y,
            frame.render_surface_list().len(),
            plan.item_count(),
            describe_damage(&damage),
        )?;
    }

    writeln!(out, "== hit testing ==")?;
    let named = [
        (page.header, "header"),
        (page.card, "card"),
        (page.flipped, "flipped"),
        (page.scroller, "scroller"),
        (page.root, "root"),
    ];
    for point in [
        Point::new(400.0, 30.0),
        Point::new(250.0, 200.0),
        Point::new(550.0, 200.0),
        Point::new(900.0, 900.0),
    ] {
        let hit = find_layer_hit_by_point(&store, &frame, point);
        let name = hit.map_or("nothing", |id| {
            named
                .iter()
                .find(|(l, _)| *l == id)
                .map_or("other", |(_, n)| *n)
        });
        writeln!(out, "({}, {}) -> {name}", point.x, point.y)?;
    }

    let events: Vec<_> = decode(recorder.as_bytes()).collect();
    let calculations = events
        .iter()
        .filter(|e| matches!(e, RecordedEvent::CalculateBegin(_)))
        .count();
    writeln!(
        out,
        "recorded {} event(s) over {calculations} calculation(s) in {} byte(s)",
        events.len(),
        recorder.as_bytes().len(),
    )?;
    Ok(())
}
