//! Scene tree node types
//!
//! Core types for the live scene tree: node ids, static modes, transforms,
//! component instances, and nodes. A node holds engine-agnostic document
//! state only; whatever renderer object backs it lives outside this crate.

use glam::{Mat4, Quat, Vec3};
use serde::Deserialize;
use serde_json::Value;

use crate::document::DocStaticMode;

/// Unique identifier for a live scene tree node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SceneNodeId(pub u64);

/// Static classification of a subtree.
///
/// `Inherits` defers to the nearest ancestor with an explicit mode; a chain
/// of `Inherits` all the way to the root resolves to `Dynamic`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StaticMode {
    Static,
    Dynamic,
    #[default]
    Inherits,
}

impl StaticMode {
    /// True for `Static` and `Dynamic`, false for `Inherits`.
    pub fn is_explicit(self) -> bool {
        !matches!(self, StaticMode::Inherits)
    }

    /// Document representation; `Inherits` is expressed by omission.
    pub fn to_doc(self) -> Option<DocStaticMode> {
        match self {
            StaticMode::Static => Some(DocStaticMode::Static),
            StaticMode::Dynamic => Some(DocStaticMode::Dynamic),
            StaticMode::Inherits => None,
        }
    }
}

impl From<DocStaticMode> for StaticMode {
    fn from(mode: DocStaticMode) -> Self {
        match mode {
            DocStaticMode::Static => StaticMode::Static,
            DocStaticMode::Dynamic => StaticMode::Dynamic,
        }
    }
}

/// Local transform relative to the parent node.
#[derive(Clone, Debug)]
pub struct LocalTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
        }
    }
}

#[derive(Deserialize)]
struct TransformProps {
    #[serde(default)]
    position: Option<Vec3>,
    #[serde(default)]
    rotation: Option<Quat>,
    #[serde(default)]
    scale: Option<f32>,
}

impl LocalTransform {
    /// Identity transform (no translation, rotation, or scaling).
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a translation-only transform.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Decode from `transform` component props. Missing fields keep their
    /// identity values; a non-object value yields `None`.
    pub fn from_props(props: &Value) -> Option<Self> {
        let decoded: TransformProps = serde_json::from_value(props.clone()).ok()?;
        Some(Self {
            position: decoded.position.unwrap_or(Vec3::ZERO),
            rotation: decoded.rotation.unwrap_or(Quat::IDENTITY),
            scale: decoded.scale.unwrap_or(1.0),
        })
    }

    /// Convert to a 4x4 matrix.
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            self.rotation,
            self.position,
        )
    }
}

/// One component attached to a node.
#[derive(Clone, Debug)]
pub struct ComponentInstance {
    pub name: String,
    /// Current props. For `src` components this is the inflated value;
    /// `Null` for components that declared neither props nor src.
    pub props: Value,
    /// Absolute URL of the external definition, if any.
    pub src: Option<String>,
    /// Whether the serializer persists this component.
    pub save: bool,
}

/// A single node in the live scene tree.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub id: SceneNodeId,
    pub name: String,
    pub parent: Option<SceneNodeId>,
    pub children: Vec<SceneNodeId>,
    pub local_transform: LocalTransform,
    pub components: Vec<ComponentInstance>,
    /// The document-facing static mode field.
    pub static_mode: StaticMode,
    /// Inherited baseline for delta serialization. Fixed once the load
    /// completes; only `static_mode` changes from user edits.
    pub original_static_mode: StaticMode,
    /// Output of the static mode resolver. Downstream consumers read this,
    /// never `static_mode` directly.
    pub resolved_static: StaticMode,
    /// This node is a synthesized placeholder for an unresolvable parent.
    pub missing: bool,
    /// The name collided during load and was suffixed.
    pub duplicate: bool,
    /// Persist this node in the editable document.
    pub save_entity: bool,
    /// Persist this node's parent/index linkage.
    pub save_parent: bool,
    /// Ephemeral helper node (gizmos etc.), never serialized.
    pub ephemeral: bool,
}

impl SceneNode {
    /// Create a new scene node with default flags.
    pub fn new(id: SceneNodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            children: Vec::new(),
            local_transform: LocalTransform::identity(),
            components: Vec::new(),
            static_mode: StaticMode::Inherits,
            original_static_mode: StaticMode::Inherits,
            resolved_static: StaticMode::Inherits,
            missing: false,
            duplicate: false,
            save_entity: false,
            save_parent: false,
            ephemeral: false,
        }
    }

    /// Find a component by name.
    pub fn component(&self, name: &str) -> Option<&ComponentInstance> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Find a component by name, mutably.
    pub fn component_mut(&mut self, name: &str) -> Option<&mut ComponentInstance> {
        self.components.iter_mut().find(|c| c.name == name)
    }
}
