//! Scene document model — live tree, loader, serializer, conflict handling.

pub mod conflict;
pub mod events;
pub mod loader;
pub mod node;
pub mod order;
pub mod serializer;
pub mod static_mode;
pub mod tree;

pub use conflict::ConflictHandler;
pub use events::{EventSink, SceneEvent};
pub use loader::{
    AssetCache, CancelToken, ChangeAction, FileAccess, LoadedModel, ModelLoader, NoopCache,
    NullModelLoader, SceneGraphLoader,
};
pub use node::{ComponentInstance, LocalTransform, SceneNode, SceneNodeId, StaticMode};
pub use order::sort_entities;
pub use serializer::serialize_scene;
pub use static_mode::{compute_and_set_static_modes, compute_static_mode};
pub use tree::SceneTree;
