//! Error types for the scene document core

use thiserror::Error;

/// Which user action produced a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// An explicit rename collided with a live entity name.
    Rename,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictKind::Rename => write!(f, "rename"),
        }
    }
}

/// Main error type for the scene document core
#[derive(Debug, Error)]
pub enum Error {
    /// The scene document was unreachable or unparsable. Fatal for that load.
    #[error("scene at {url} is damaged: {reason}")]
    SceneLoader { url: String, reason: String },

    /// An explicit user action would collide with a live entity name.
    /// Surfaced to the caller instead of auto-suffixing.
    #[error("{kind} conflict in {scene_uri}: \"{name}\" is already taken")]
    Conflict {
        kind: ConflictKind,
        scene_uri: String,
        name: String,
    },

    /// A document declares neither `root` nor `inherits`, or both.
    #[error("scene configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The load was aborted through its cancel token.
    #[error("scene load cancelled")]
    Cancelled,
}
