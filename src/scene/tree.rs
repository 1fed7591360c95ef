//! Live scene tree — the named entity hierarchy built by the loader.
//!
//! Nodes are stored flat and linked by id; names are unique across the tree
//! and every name assignment goes through the attached `ConflictHandler`.
//! Edit operations (rename, reparent, static-mode change) mark the touched
//! nodes save-worthy so the serializer persists them in the overlay
//! document.

use std::collections::HashMap;

use serde_json::Value;

use crate::core::error::{ConflictKind, Error};
use crate::core::types::Result;

use super::conflict::ConflictHandler;
use super::events::{EventSink, SceneEvent};
use super::node::{SceneNode, SceneNodeId, StaticMode};

#[derive(Debug)]
pub struct SceneTree {
    nodes: HashMap<SceneNodeId, SceneNode>,
    by_name: HashMap<String, SceneNodeId>,
    root: SceneNodeId,
    next_id: u64,
    conflicts: ConflictHandler,
    events: EventSink,
    /// Free-form document metadata (name, attribution, feature flags).
    pub metadata: serde_json::Map<String, Value>,
    /// Absolute URI of the editable (root) document, once known.
    pub uri: Option<String>,
    /// Absolute URI of the direct inheritance ancestor, if any.
    pub inherits_from: Option<String>,
    /// Full inheritance chain, direct ancestor first.
    pub ancestors: Vec<String>,
}

impl SceneTree {
    /// Create a tree holding only a root node with the given scene name.
    pub fn new(root_name: impl Into<String>) -> Self {
        let mut conflicts = ConflictHandler::new();
        let root_id = SceneNodeId(0);
        let name = conflicts.claim_name(&root_name.into());
        let root_node = SceneNode::new(root_id, &name);

        let mut nodes = HashMap::new();
        nodes.insert(root_id, root_node);
        let mut by_name = HashMap::new();
        by_name.insert(name, root_id);

        Self {
            nodes,
            by_name,
            root: root_id,
            next_id: 1,
            conflicts,
            events: EventSink::disconnected(),
            metadata: serde_json::Map::new(),
            uri: None,
            inherits_from: None,
            ancestors: Vec::new(),
        }
    }

    /// Get the root node ID.
    pub fn root(&self) -> SceneNodeId {
        self.root
    }

    /// Name of the root node (the scene name for standalone documents).
    pub fn root_name(&self) -> &str {
        &self.nodes[&self.root].name
    }

    /// Attach a subscriber for mutation events.
    pub fn set_event_sink(&mut self, events: EventSink) {
        self.events = events;
    }

    fn alloc_id(&mut self) -> SceneNodeId {
        let id = SceneNodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Get an immutable reference to a node.
    pub fn get(&self, id: SceneNodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    /// Get a mutable reference to a node.
    ///
    /// Callers must not change `name` through this; renames go through
    /// [`SceneTree::rename`] so the conflict handler stays coherent.
    pub fn get_mut(&mut self, id: SceneNodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    /// Look up a node id by its unique name.
    pub fn find_by_name(&self, name: &str) -> Option<SceneNodeId> {
        self.by_name.get(name).copied()
    }

    /// Iterate over the children of a node.
    pub fn children(&self, id: SceneNodeId) -> impl Iterator<Item = SceneNodeId> + '_ {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .copied()
    }

    /// Total number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add a child node under `parent`, appended after existing siblings.
    /// Returns the new node's ID. A colliding name is suffixed and the node
    /// marked `duplicate`; programmatic insertion never errors.
    pub fn add_child(&mut self, parent: SceneNodeId, name: &str) -> SceneNodeId {
        self.insert_child_at(parent, name, None)
    }

    /// Add a child node under `parent` at the given sibling position
    /// (clamped; `None` appends).
    pub fn insert_child_at(
        &mut self,
        parent: SceneNodeId,
        name: &str,
        index: Option<usize>,
    ) -> SceneNodeId {
        let id = self.alloc_id();
        let final_name = self.conflicts.claim_name(name);
        let mut node = SceneNode::new(id, &final_name);
        node.duplicate = final_name != name;
        if node.duplicate {
            self.conflicts.set_duplicate_status(true);
        }
        node.parent = Some(parent);

        self.by_name.insert(final_name.clone(), id);
        self.nodes.insert(id, node);

        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            let at = index.unwrap_or(parent_node.children.len()).min(parent_node.children.len());
            parent_node.children.insert(at, id);
        }

        self.events.emit(SceneEvent::NodeAdded { name: final_name });
        id
    }

    /// True if `ancestor` is `id` itself or appears on `id`'s parent chain.
    pub fn is_ancestor(&self, ancestor: SceneNodeId, id: SceneNodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.nodes.get(&node_id).and_then(|n| n.parent);
        }
        false
    }

    fn detach(&mut self, id: SceneNodeId) {
        if let Some(parent_id) = self.nodes.get(&id).and_then(|n| n.parent) {
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.children.retain(|c| *c != id);
            }
        }
    }

    /// Move an existing node under `parent` at the given sibling position
    /// (clamped; `None` appends). Attaching a node under its own subtree is
    /// rejected to keep the parent graph acyclic.
    pub fn attach_at(
        &mut self,
        id: SceneNodeId,
        parent: SceneNodeId,
        index: Option<usize>,
    ) -> Result<()> {
        if id == self.root {
            return Err(Error::Config("cannot reattach the scene root".into()));
        }
        if self.is_ancestor(id, parent) {
            return Err(Error::Config(format!(
                "attaching \"{}\" under its own subtree would create a cycle",
                self.nodes.get(&id).map(|n| n.name.as_str()).unwrap_or("?")
            )));
        }

        self.detach(id);
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            let at = index.unwrap_or(parent_node.children.len()).min(parent_node.children.len());
            parent_node.children.insert(at, id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = Some(parent);
        }
        Ok(())
    }

    /// User-facing reparent: moves the node and marks it save-worthy.
    pub fn reparent(
        &mut self,
        id: SceneNodeId,
        new_parent: SceneNodeId,
        index: Option<usize>,
    ) -> Result<()> {
        self.attach_at(id, new_parent, index)?;
        let parent_name = self.nodes[&new_parent].name.clone();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.save_entity = true;
            node.save_parent = true;
            self.events.emit(SceneEvent::NodeReparented {
                name: node.name.clone(),
                new_parent: parent_name,
            });
        }
        Ok(())
    }

    /// User-facing rename.
    ///
    /// Renaming to a name another live node holds raises a conflict error
    /// and leaves both names unchanged; explicit user action is never
    /// silently suffixed.
    pub fn rename(&mut self, id: SceneNodeId, new_name: &str) -> Result<()> {
        let Some(node) = self.nodes.get(&id) else {
            return Err(Error::Config("rename target does not exist".into()));
        };
        let old_name = node.name.clone();
        if old_name == new_name {
            return Ok(());
        }
        if !self.conflicts.is_unique_name(new_name) {
            return Err(Error::Conflict {
                kind: ConflictKind::Rename,
                scene_uri: self.uri.clone().unwrap_or_default(),
                name: new_name.to_string(),
            });
        }

        self.conflicts.release_name(&old_name);
        let final_name = self.conflicts.claim_name(new_name);
        self.by_name.remove(&old_name);
        self.by_name.insert(final_name.clone(), id);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.name = final_name.clone();
            node.duplicate = false;
            node.save_entity = true;
        }
        self.events.emit(SceneEvent::NodeRenamed {
            from: old_name,
            to: final_name,
        });
        Ok(())
    }

    /// Set the user-facing static mode and mark the node save-worthy.
    /// `original_static_mode` is load-time state and stays untouched.
    pub fn set_static_mode(&mut self, id: SceneNodeId, mode: StaticMode) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.static_mode = mode;
            node.save_entity = true;
            self.events.emit(SceneEvent::NodeChanged {
                name: node.name.clone(),
            });
        }
    }

    /// Remove a node and its entire subtree. Cannot remove the root.
    pub fn remove(&mut self, id: SceneNodeId) {
        if id == self.root {
            return;
        }

        // Collect subtree IDs (BFS)
        let mut to_remove = vec![id];
        let mut i = 0;
        while i < to_remove.len() {
            let current = to_remove[i];
            if let Some(node) = self.nodes.get(&current) {
                to_remove.extend_from_slice(&node.children);
            }
            i += 1;
        }

        self.detach(id);

        let name = self.nodes.get(&id).map(|n| n.name.clone());
        for nid in to_remove {
            if let Some(node) = self.nodes.remove(&nid) {
                self.conflicts.release_name(&node.name);
                self.by_name.remove(&node.name);
            }
        }

        if let Some(name) = name {
            self.events.emit(SceneEvent::NodeRemoved { name });
        }
    }

    /// Depth-first node ids, root first, siblings in child order.
    pub fn ids_depth_first(&self) -> Vec<SceneNodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else { continue };
            out.push(id);
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Position of `id` among its parent's children.
    pub fn sibling_index(&self, id: SceneNodeId) -> Option<usize> {
        let parent_id = self.nodes.get(&id)?.parent?;
        self.nodes
            .get(&parent_id)?
            .children
            .iter()
            .position(|c| *c == id)
    }

    /// Rebuild the conflict handler's counters and the name index from the
    /// whole tree.
    ///
    /// Establishes ground truth after a structural load: nodes whose name
    /// collides in depth-first order get suffixed and flagged `duplicate`,
    /// and the aggregate missing/duplicate flags are recomputed.
    pub fn find_duplicates(&mut self) {
        self.conflicts.reset();

        let mut by_name = HashMap::with_capacity(self.nodes.len());
        let mut has_missing = false;
        let mut has_duplicates = false;
        for id in self.ids_depth_first() {
            let current = self.nodes[&id].name.clone();
            let final_name = self.conflicts.claim_name(&current);
            if final_name != current {
                log::warn!("duplicate entity name \"{current}\" renamed to \"{final_name}\"");
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.name = final_name.clone();
                    node.duplicate = true;
                }
                has_duplicates = true;
            }
            by_name.insert(final_name, id);
            let node = &self.nodes[&id];
            has_missing |= node.missing;
            has_duplicates |= node.duplicate;
        }
        self.by_name = by_name;

        self.conflicts.set_missing_status(has_missing);
        self.conflicts.set_duplicate_status(has_duplicates);
    }

    /// Scene-wide "has unresolvable parent reference" flag.
    pub fn set_missing_status(&mut self, missing: bool) {
        self.conflicts.set_missing_status(missing);
    }

    pub fn has_missing_nodes(&self) -> bool {
        self.conflicts.has_missing()
    }

    pub fn has_duplicate_names(&self) -> bool {
        self.conflicts.has_duplicates()
    }

    /// The attached conflict handler.
    pub fn conflicts(&self) -> &ConflictHandler {
        &self.conflicts
    }
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new("Scene")
    }
}
