//! Scene serializer — flat persisted document from the live tree.
//!
//! The inverse of the loader's overlay application. Only save-worthy state
//! is emitted: the overlay document stays a diff against its inheritance
//! ancestor, not a full copy of the resolved tree.

use crate::document::{ComponentRecord, EntityRecord, SceneDocument, uri};

use super::tree::SceneTree;

/// Walk the live tree depth-first and emit the persisted document.
///
/// Per node: skipped entirely unless `save_entity` (and never if
/// `ephemeral`); `parent`/`index` only when `save_parent` and the parent is
/// a real entity (not the scene root); `staticMode` only when it differs
/// from the load-time baseline; components only when marked save-worthy,
/// with external definitions re-relativized against the document URI.
pub fn serialize_scene(tree: &SceneTree) -> SceneDocument {
    let mut doc = SceneDocument::default();
    let base = tree.uri.as_deref().unwrap_or("");

    match &tree.inherits_from {
        Some(ancestor) => doc.inherits = Some(uri::relativize(base, ancestor)),
        None => doc.root = Some(tree.root_name().to_string()),
    }
    doc.metadata = tree.metadata.clone();

    for id in tree.ids_depth_first() {
        if id == tree.root() {
            continue;
        }
        let Some(node) = tree.get(id) else { continue };
        if node.ephemeral || !node.save_entity {
            continue;
        }

        let mut record = EntityRecord::default();

        if node.save_parent {
            if let Some(parent_id) = node.parent.filter(|p| *p != tree.root()) {
                if let Some(parent) = tree.get(parent_id) {
                    record.parent = Some(parent.name.clone());
                    record.index = tree.sibling_index(id);
                }
            }
        }

        for component in &node.components {
            if !component.save {
                continue;
            }
            record.components.push(match &component.src {
                Some(absolute) => ComponentRecord {
                    name: component.name.clone(),
                    props: None,
                    src: Some(uri::relativize(base, absolute)),
                },
                None => ComponentRecord {
                    name: component.name.clone(),
                    props: if component.props.is_null() {
                        None
                    } else {
                        Some(component.props.clone())
                    },
                    src: None,
                },
            });
        }

        if node.static_mode != node.original_static_mode {
            record.static_mode = node.static_mode.to_doc();
        }

        doc.entities.insert(node.name.clone(), record);
    }

    doc
}
