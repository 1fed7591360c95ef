//! Duplicate-name accounting and structural integrity flags.
//!
//! Every node name in a loaded scene passes through `claim_name`, which
//! keeps one usage counter per base name ("Box 2" counts against "Box").
//! The counter is a monotonic allocator: releasing a name decrements its
//! counter but never renumbers other nodes, so removing and re-adding a
//! node may hand it a different suffix.

use std::collections::{HashMap, HashSet};

/// Tracks per-base-name usage counts and scene-wide integrity flags.
#[derive(Debug, Default)]
pub struct ConflictHandler {
    counters: HashMap<String, u32>,
    live: HashSet<String>,
    has_duplicates: bool,
    has_missing: bool,
}

/// Strip a trailing `" <digits>"` suffix: `"Box 2"` → `"Box"`.
fn base_name(name: &str) -> &str {
    match name.rsplit_once(' ') {
        Some((base, suffix))
            if !base.is_empty() && !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => name,
    }
}

/// Numeric suffix of a name, if it has one: `"Box 2"` → `Some(2)`.
fn name_suffix(name: &str) -> Option<u32> {
    match name.rsplit_once(' ') {
        Some((base, suffix)) if !base.is_empty() => suffix.parse().ok(),
        _ => None,
    }
}

impl ConflictHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node name, returning the final (possibly suffixed) name.
    ///
    /// A proposed name nobody holds is kept as-is; a collision allocates
    /// `"{base} {counter}"` from the base name's monotonic counter. This is
    /// the only path by which a node's name is assigned.
    pub fn claim_name(&mut self, proposed: &str) -> String {
        let base = base_name(proposed);
        if !self.live.contains(proposed) {
            // First holder keeps the exact name. Seed the counter so later
            // claims of the same base continue numbering past this suffix.
            let seed = name_suffix(proposed).map(|n| n + 1).unwrap_or(1);
            let counter = self.counters.entry(base.to_string()).or_insert(0);
            *counter = (*counter).max(seed);
            self.live.insert(proposed.to_string());
            return proposed.to_string();
        }

        let counter = self.counters.entry(base.to_string()).or_insert(1);
        loop {
            let candidate = format!("{base} {counter}");
            *counter += 1;
            if !self.live.contains(&candidate) {
                self.live.insert(candidate.clone());
                return candidate;
            }
        }
    }

    /// Unregister a node name. Decrements the base counter (never below
    /// zero) without renumbering any other node.
    pub fn release_name(&mut self, name: &str) {
        self.live.remove(name);
        if let Some(counter) = self.counters.get_mut(base_name(name)) {
            *counter = counter.saturating_sub(1);
        }
    }

    /// True iff no live node currently holds exactly `name`.
    pub fn is_unique_name(&self, name: &str) -> bool {
        !self.live.contains(name)
    }

    /// Drop all counters and flags ahead of a full-tree rebuild.
    pub fn reset(&mut self) {
        self.counters.clear();
        self.live.clear();
        self.has_duplicates = false;
        self.has_missing = false;
    }

    /// Scene-wide "has unresolvable parent reference" flag.
    pub fn set_missing_status(&mut self, missing: bool) {
        self.has_missing = missing;
    }

    /// Scene-wide "has duplicate name" flag.
    pub fn set_duplicate_status(&mut self, duplicates: bool) {
        self.has_duplicates = duplicates;
    }

    pub fn has_missing(&self) -> bool {
        self.has_missing
    }

    pub fn has_duplicates(&self) -> bool {
        self.has_duplicates
    }

    /// Number of live names. Ground truth after `SceneTree::find_duplicates`.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
