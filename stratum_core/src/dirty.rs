// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Stratum uses multi-channel dirty tracking (via [`understory_dirty`]) to
//! record which layers changed between two draw-property calculations. The
//! calculation itself always recomputes the whole tree; the channels exist
//! so that consumers such as damage trackers know *what* moved.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`GEOMETRY`] and [`OPACITY`] use
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and have dependency
//!   edges from child to parent. Marking a parent dirty marks every
//!   descendant, because draw transforms, clips and draw opacities are
//!   inherited.
//!
//! - **Local-only**: [`CONTENT`] is marked with the default policy. Only
//!   the explicitly marked layer appears in the drain output.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on tree mutations
//!   (add/remove child, create/destroy layer, mask and replica attachment).
//!
//! # Consumption
//!
//! [`LayerStore::drain_changes`](crate::layer::LayerStore::drain_changes)
//! drains every channel and reports the result as
//! [`FrameChanges`](crate::layer::FrameChanges).

use understory_dirty::Channel;

/// Transform, position, anchor, bounds, scroll or flag change. Affects the
/// draw transforms and clips of descendants.
pub const GEOMETRY: Channel = Channel::new(0);

/// Opacity change. Affects the draw opacity of descendants.
pub const OPACITY: Channel = Channel::new(1);

/// Content change: draws-content, contents scale mode, mask or replica.
pub const CONTENT: Channel = Channel::new(2);

/// Tree topology changed.
pub const TOPOLOGY: Channel = Channel::new(3);
