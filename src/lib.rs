//! Diorama - scene document core for a 3D scene editor
//!
//! The document model behind the editor: a hierarchical named-entity tree
//! loaded from (and serialized back to) a flat JSON format, with multi-level
//! scene inheritance, name-conflict resolution, deterministic sibling
//! ordering, and static-mode propagation for downstream optimization.
//! Rendering, UI, and asset caches live outside this crate and plug in
//! through the loader's collaborator traits.

pub mod core;
pub mod document;
pub mod io;
pub mod scene;
