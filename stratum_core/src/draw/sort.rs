// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth ordering inside a 3D rendering context.

use alloc::vec::Vec;

use kurbo::Rect;

use crate::geometry::map_point3;
use crate::layer::LayerId;
use crate::transform::Transform3d;

/// Target-space depth of the center of `rect` under `transform`.
///
/// Centers behind the viewer sort to the back.
pub(crate) fn center_depth(transform: &Transform3d, rect: Rect) -> f64 {
    let c = rect.center();
    let ([_, _, z], clipped) = map_point3(transform, [c.x, c.y, 0.0]);
    if clipped { f64::NEG_INFINITY } else { z }
}

/// Stably reorders `entries` back to front (ascending depth).
///
/// Entries at equal depth keep their paint order.
pub(crate) fn sort_back_to_front(entries: &mut [LayerId], depth: impl Fn(LayerId) -> f64) {
    if entries.len() < 2 {
        return;
    }
    let mut keyed: Vec<(f64, LayerId)> = entries.iter().map(|&id| (depth(id), id)).collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    for (slot, (_, id)) in entries.iter_mut().zip(keyed) {
        *slot = id;
    }
}
