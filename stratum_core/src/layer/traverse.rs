// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use alloc::vec::Vec;

use super::id::{INVALID, LayerId};
use super::store::LayerStore;

/// An iterator over the direct children of a layer.
///
/// Created by [`LayerStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a LayerStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a LayerStore, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = LayerId;

    fn next(&mut self) -> Option<LayerId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.next_sibling[idx as usize];
        Some(LayerId {
            idx,
            generation: self.store.generation[idx as usize],
        })
    }
}

impl LayerStore {
    /// Finds the layer with slot `index` in the subtree rooted at `root`.
    ///
    /// The search covers children as well as mask and replica layers (and
    /// the replica's mask). Returns `None` if no layer in the subtree has
    /// that index.
    #[must_use]
    pub fn find_layer_in_subtree(&self, root: LayerId, index: u32) -> Option<LayerId> {
        self.validate(root);
        let mut stack = Vec::new();
        stack.push(root.idx);
        while let Some(idx) = stack.pop() {
            if idx == index {
                return self.handle(idx);
            }
            let i = idx as usize;
            for attachment in [self.mask_layer[i], self.replica_layer[i]] {
                if attachment != INVALID {
                    stack.push(attachment);
                }
            }
            let mut child = self.first_child[i];
            while child != INVALID {
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::layer::LayerStore;

    #[test]
    fn finds_children_masks_and_replica_masks() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        let child = store.create_layer();
        let grandchild = store.create_layer();
        let mask = store.create_layer();
        let replica = store.create_layer();
        let replica_mask = store.create_layer();
        store.add_child(root, child);
        store.add_child(child, grandchild);
        store.set_mask_layer(child, Some(mask));
        store.set_replica_layer(grandchild, Some(replica));
        store.set_mask_layer(replica, Some(replica_mask));

        for id in [root, child, grandchild, mask, replica, replica_mask] {
            assert_eq!(store.find_layer_in_subtree(root, id.index()), Some(id));
        }
        assert_eq!(store.find_layer_in_subtree(child, root.index()), None);
    }

    #[test]
    fn missing_index_returns_none() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        let detached = store.create_layer();
        assert_eq!(store.find_layer_in_subtree(root, detached.index()), None);
        assert_eq!(store.find_layer_in_subtree(root, 1000), None);
    }
}
