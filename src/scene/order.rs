//! Deterministic entity ordering from flat parent/index pairs.
//!
//! The persisted document stores entities as a flat map; tree insertion
//! order is reconstructed from each record's `parent` and `index` fields.
//! The loader applies entities in this order so a child's parent node
//! always exists before the child is constructed.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::document::EntityRecord;

/// Order entity names so every parent precedes its descendants and siblings
/// appear in ascending `index` order.
///
/// Entities whose `parent` is absent from the map are rootable and keep
/// their encountered order. Undeclared indices sort after declared ones;
/// index ties keep map insertion order (stable sort). Entries trapped in a
/// parent cycle are appended in map order rather than dropped.
pub fn sort_entities(entities: &IndexMap<String, EntityRecord>) -> Vec<String> {
    let mut roots: Vec<&str> = Vec::new();
    let mut children_of: IndexMap<&str, Vec<(&str, usize)>> = IndexMap::new();

    for (name, record) in entities {
        let declared_parent = record
            .parent
            .as_deref()
            .filter(|p| entities.contains_key(*p));
        match declared_parent {
            Some(parent) => children_of
                .entry(parent)
                .or_default()
                .push((name.as_str(), record.index.unwrap_or(usize::MAX))),
            None => roots.push(name.as_str()),
        }
    }

    for group in children_of.values_mut() {
        group.sort_by_key(|&(_, index)| index);
    }

    fn visit<'a>(
        name: &'a str,
        children_of: &IndexMap<&str, Vec<(&'a str, usize)>>,
        seen: &mut HashSet<&'a str>,
        out: &mut Vec<String>,
    ) {
        if !seen.insert(name) {
            return;
        }
        out.push(name.to_string());
        if let Some(group) = children_of.get(name) {
            for &(child, _) in group {
                visit(child, children_of, seen, out);
            }
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut ordered = Vec::with_capacity(entities.len());
    for root in roots {
        visit(root, &children_of, &mut seen, &mut ordered);
    }

    // Cycle members never become reachable from a root; keep them anyway.
    if ordered.len() < entities.len() {
        for name in entities.keys() {
            if !seen.contains(name.as_str()) {
                ordered.push(name.clone());
            }
        }
    }

    ordered
}
