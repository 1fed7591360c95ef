//! Static mode resolution.
//!
//! An author marks one ancestor `Static` and every descendant inherits the
//! classification unless it explicitly overrides it back to `Dynamic`. The
//! resolver walks ancestors and writes the result to each node's
//! `resolved_static` side channel; the document-facing `static_mode` field
//! is never touched here.

use super::node::{SceneNodeId, StaticMode};
use super::tree::SceneTree;

/// Resolve the effective mode for one node.
///
/// Walks `node → parent → ...` until an explicit mode is found. A chain of
/// `Inherits` all the way past the root resolves to `Dynamic`: the default
/// is permissive, never silently `Static`.
pub fn compute_static_mode(tree: &SceneTree, id: SceneNodeId) -> StaticMode {
    let mut current = Some(id);
    while let Some(node_id) = current {
        let Some(node) = tree.get(node_id) else { break };
        if node.static_mode.is_explicit() {
            return node.static_mode;
        }
        current = node.parent;
    }
    StaticMode::Dynamic
}

/// Resolve every node in the tree and cache the result on
/// `resolved_static`. Consumers (mesh combination, export) read the cached
/// value, not the raw field.
pub fn compute_and_set_static_modes(tree: &mut SceneTree) {
    for id in tree.ids_depth_first() {
        let resolved = compute_static_mode(tree, id);
        if let Some(node) = tree.get_mut(id) {
            node.resolved_static = resolved;
        }
    }
}
