//! Scene graph loader — inheritance resolution and overlay application.
//!
//! A load walks the document's `inherits` chain to its standalone root,
//! builds the ancestor tree, then overlays the current document's entities
//! in resolver order. Missing parent references synthesize placeholder
//! nodes instead of failing; a damaged document is fatal for that load.
//! Collaborators (file access, model import, asset caches) are injected
//! through dyn-compatible traits so the core stays engine-agnostic.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tokio::task::JoinSet;

use diorama_watch::FileEvent;

use crate::core::error::Error;
use crate::core::types::Result;
use crate::document::{SceneDocument, uri};

use super::events::{EventSink, SceneEvent};
use super::node::{ComponentInstance, LocalTransform, StaticMode};
use super::order::sort_entities;
use super::serializer::serialize_scene;
use super::static_mode::compute_and_set_static_modes;
use super::tree::SceneTree;

/// Boxed future used by the collaborator traits to stay dyn-compatible.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// File-access seam: document and component retrieval by URI.
pub trait FileAccess: Send + Sync {
    fn read_text<'a>(&'a self, uri: &'a str) -> BoxFuture<'a, io::Result<String>>;
    fn write_text<'a>(&'a self, uri: &'a str, text: &'a str) -> BoxFuture<'a, io::Result<()>>;
}

/// An opaque model import, wrapped by the loader as a single-entity scene.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub name: String,
    pub animations: Vec<String>,
}

/// Model loader seam for URIs with a recognized 3D-model extension.
pub trait ModelLoader: Send + Sync {
    fn load_model<'a>(&'a self, uri: &'a str) -> BoxFuture<'a, Result<LoadedModel>>;
}

/// Fallback model loader for installations without a 3D import pipeline.
pub struct NullModelLoader;

impl ModelLoader for NullModelLoader {
    fn load_model<'a>(&'a self, uri: &'a str) -> BoxFuture<'a, Result<LoadedModel>> {
        let err = Error::SceneLoader {
            url: uri.to_string(),
            reason: "no model loader available".to_string(),
        };
        Box::pin(async move { Err(err) })
    }
}

/// Eviction hook for external URL-keyed caches (textures, models). The
/// caches themselves live outside this crate; the loader only tells them
/// when a file they may hold went stale.
pub trait AssetCache: Send + Sync {
    fn evict(&self, uri: &str);
}

/// Cache hook that ignores evictions.
pub struct NoopCache;

impl AssetCache for NoopCache {
    fn evict(&self, _uri: &str) {}
}

/// Cooperative cancellation for in-flight loads.
///
/// Cancelling aborts the load at the next await point; the partially-built
/// tree is discarded.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// What the editor should do in response to a file-change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    /// The open scene's own document changed on disk.
    ReloadScene,
    /// The change was this process's own save; suppressed once.
    Ignore,
    /// Some other asset changed; its cache entry was evicted.
    Evicted,
}

pub struct SceneGraphLoader {
    files: Arc<dyn FileAccess>,
    models: Arc<dyn ModelLoader>,
    cache: Arc<dyn AssetCache>,
    events: EventSink,
    cancel: CancelToken,
    ignore_next_scene_file_change: bool,
}

impl SceneGraphLoader {
    pub fn new(files: Arc<dyn FileAccess>) -> Self {
        Self {
            files,
            models: Arc::new(NullModelLoader),
            cache: Arc::new(NoopCache),
            events: EventSink::disconnected(),
            cancel: CancelToken::new(),
            ignore_next_scene_file_change: false,
        }
    }

    pub fn with_model_loader(mut self, models: Arc<dyn ModelLoader>) -> Self {
        self.models = models;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn AssetCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Load a scene, resolving its full inheritance chain.
    ///
    /// A URI with a recognized model extension is delegated to the model
    /// loader and wrapped as a single-entity scene.
    pub async fn load(&self, uri: &str) -> Result<SceneTree> {
        self.cancel.check()?;
        if uri::is_model_uri(uri) {
            let model = self.models.load_model(uri).await?;
            self.cancel.check()?;
            return Ok(self.wrap_model(uri, model));
        }
        self.load_scene(uri.to_string(), true).await
    }

    /// Serialize and write the tree back to its document, then notify the
    /// external caches and arm the self-change suppression flag.
    pub async fn save(&mut self, tree: &SceneTree) -> Result<()> {
        let uri = tree
            .uri
            .clone()
            .ok_or_else(|| Error::Config("scene has no document URI to save to".into()))?;
        let doc = serialize_scene(tree);
        let text = doc.to_json()?;
        self.files.write_text(&uri, &text).await?;

        // The watcher will report our own write; suppress that one reload.
        self.ignore_next_scene_file_change = true;
        self.cache.evict(&uri);
        self.events.emit(SceneEvent::SceneSaved { uri });
        Ok(())
    }

    /// Route a file-change notification.
    ///
    /// The open scene's own URI triggers a reload unless the suppression
    /// flag is armed (one-shot). Any other path is forwarded to the asset
    /// cache's eviction hook.
    pub fn handle_file_event(
        &mut self,
        scene_uri: Option<&str>,
        event: &FileEvent,
    ) -> ChangeAction {
        let path = event.path();
        if scene_uri == Some(path) {
            if self.ignore_next_scene_file_change {
                self.ignore_next_scene_file_change = false;
                return ChangeAction::Ignore;
            }
            return ChangeAction::ReloadScene;
        }
        self.cache.evict(path);
        ChangeAction::Evicted
    }

    fn wrap_model(&self, uri: &str, model: LoadedModel) -> SceneTree {
        let mut tree = SceneTree::new(uri::file_stem(uri));
        tree.uri = Some(uri.to_string());
        tree.set_event_sink(self.events.clone());

        let id = tree.add_child(tree.root(), &model.name);
        if let Some(node) = tree.get_mut(id) {
            node.components.push(ComponentInstance {
                name: "model".into(),
                props: serde_json::json!({ "animations": model.animations }),
                src: Some(uri.to_string()),
                save: true,
            });
        }

        compute_and_set_static_modes(&mut tree);
        self.events.emit(SceneEvent::SceneLoaded {
            uri: uri.to_string(),
        });
        tree
    }

    /// Recursive worker: ancestors resolve depth-first before the current
    /// document's entities overlay them.
    fn load_scene<'a>(&'a self, uri: String, is_root: bool) -> BoxFuture<'a, Result<SceneTree>> {
        Box::pin(async move {
            self.cancel.check()?;
            let text = self
                .files
                .read_text(&uri)
                .await
                .map_err(|e| Error::SceneLoader {
                    url: uri.clone(),
                    reason: e.to_string(),
                })?;
            let doc = SceneDocument::parse(&uri, &text)?;
            self.cancel.check()?;

            let mut tree = if let Some(inherits) = &doc.inherits {
                let ancestor_uri = uri::resolve(&uri, inherits);
                log::debug!("scene {uri} inherits {ancestor_uri}");
                let mut tree = self.load_scene(ancestor_uri.clone(), false).await?;
                tree.inherits_from = Some(ancestor_uri.clone());
                tree.ancestors.insert(0, ancestor_uri);
                tree
            } else if let Some(root_name) = &doc.root {
                SceneTree::new(root_name.as_str())
            } else {
                // Unreachable after parse-time validation; kept as the
                // configuration error the contract names.
                return Err(Error::Config(format!(
                    "{uri}: declares neither \"root\" nor \"inherits\""
                )));
            };

            tree.metadata.extend(doc.metadata.clone());

            if is_root {
                tree.uri = Some(uri.clone());
                tree.set_event_sink(self.events.clone());
                // Seed the name counters from the inherited tree before any
                // current-document entities are applied.
                tree.find_duplicates();
            }

            self.apply_entities(&mut tree, &doc, &uri, is_root).await?;

            if is_root {
                tree.find_duplicates();
                compute_and_set_static_modes(&mut tree);
                self.events.emit(SceneEvent::SceneLoaded { uri: uri.clone() });
            }

            Ok(tree)
        })
    }

    /// Overlay one document's entities onto the tree, in resolver order.
    async fn apply_entities(
        &self,
        tree: &mut SceneTree,
        doc: &SceneDocument,
        doc_uri: &str,
        is_root: bool,
    ) -> Result<()> {
        // External component definitions are independent of tree order;
        // fetch them all concurrently up front.
        let mut fetches: JoinSet<((String, usize), String, io::Result<String>)> = JoinSet::new();
        for (entity_name, record) in &doc.entities {
            for (ci, component) in record.components.iter().enumerate() {
                if let Some(src) = &component.src {
                    let absolute = uri::resolve(doc_uri, src);
                    let files = Arc::clone(&self.files);
                    let key = (entity_name.clone(), ci);
                    fetches.spawn(async move {
                        let text = files.read_text(&absolute).await;
                        (key, absolute, text)
                    });
                }
            }
        }

        let mut inflated: HashMap<(String, usize), (String, Value)> = HashMap::new();
        while let Some(joined) = fetches.join_next().await {
            let Ok((key, absolute, fetched)) = joined else {
                log::error!("component fetch task panicked");
                continue;
            };
            let value = match fetched {
                Ok(text) => match serde_json::from_str(&text) {
                    Ok(value) => value,
                    Err(e) => {
                        log::warn!("component src {absolute} is not valid JSON: {e}");
                        Value::Object(serde_json::Map::new())
                    }
                },
                Err(e) => {
                    // Hand-edited content often points at files that moved;
                    // degrade to empty props instead of failing the load.
                    log::warn!("component src {absolute} unavailable: {e}");
                    Value::Object(serde_json::Map::new())
                }
            };
            inflated.insert(key, (absolute, value));
        }
        self.cancel.check()?;

        for name in sort_entities(&doc.entities) {
            let Some(record) = doc.entities.get(&name) else {
                continue;
            };

            // Resolve the parent first; an unresolvable reference becomes a
            // placeholder so the author can open and repair the scene.
            let parent_id = match record.parent.as_deref() {
                Some(parent_name) => Some(match tree.find_by_name(parent_name) {
                    Some(pid) => pid,
                    None => {
                        log::warn!(
                            "scene {doc_uri}: entity \"{name}\" references missing parent \"{parent_name}\""
                        );
                        let pid = tree.add_child(tree.root(), parent_name);
                        if let Some(placeholder) = tree.get_mut(pid) {
                            placeholder.missing = true;
                        }
                        tree.set_missing_status(true);
                        pid
                    }
                }),
                None => None,
            };

            // Find-or-create: entities inherited from an ancestor are
            // mutated in place, not recreated.
            let id = match tree.find_by_name(&name) {
                Some(id) => {
                    if let Some(pid) = parent_id {
                        if let Err(e) = tree.attach_at(id, pid, record.index) {
                            log::warn!("scene {doc_uri}: {e}");
                        }
                    }
                    id
                }
                None => tree.insert_child_at(parent_id.unwrap_or(tree.root()), &name, record.index),
            };

            if is_root {
                if let Some(node) = tree.get_mut(id) {
                    node.save_entity = true;
                    if record.parent.is_some() {
                        node.save_parent = true;
                    }
                }
            }

            for (ci, component) in record.components.iter().enumerate() {
                let (src, props) = if component.src.is_some() {
                    match inflated.remove(&(name.clone(), ci)) {
                        Some((absolute, value)) => (Some(absolute), value),
                        None => continue,
                    }
                } else {
                    (None, component.props.clone().unwrap_or(Value::Null))
                };

                if let Some(node) = tree.get_mut(id) {
                    match node.component_mut(&component.name) {
                        Some(existing) => {
                            merge_json(&mut existing.props, &props);
                            if src.is_some() {
                                existing.src = src;
                            }
                            existing.save = true;
                        }
                        None => node.components.push(ComponentInstance {
                            name: component.name.clone(),
                            props,
                            src,
                            save: true,
                        }),
                    }
                }
            }

            if let Some(node) = tree.get_mut(id) {
                if let Some(transform) = node
                    .component("transform")
                    .and_then(|c| LocalTransform::from_props(&c.props))
                {
                    node.local_transform = transform;
                }

                if let Some(mode) = record.static_mode {
                    let mode = StaticMode::from(mode);
                    node.static_mode = mode;
                    // Ancestor levels establish the inherited baseline; the
                    // root document's declarations are deltas against it.
                    if !is_root {
                        node.original_static_mode = mode;
                    }
                }
            }
        }

        Ok(())
    }
}

/// Merge `overlay` into `target`: objects merge per key, `Null` keeps the
/// target, everything else replaces it.
fn merge_json(target: &mut Value, overlay: &Value) {
    match (target, overlay) {
        (_, Value::Null) => {}
        (Value::Object(target_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match target_map.get_mut(key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        target_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, overlay) => *target = overlay.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryFileAccess;
    use serde_json::json;

    fn loader_for(files: MemoryFileAccess) -> SceneGraphLoader {
        SceneGraphLoader::new(Arc::new(files))
    }

    #[tokio::test]
    async fn test_load_standalone_scene() {
        let files = MemoryFileAccess::new();
        files.put(
            "scenes/main.json",
            json!({
                "root": "Main",
                "metadata": { "name": "Test scene" },
                "entities": {
                    "Desk": { "components": [{ "name": "geometry", "props": { "kind": "box" } }] },
                    "Lamp": { "parent": "Desk", "index": 0 }
                }
            })
            .to_string(),
        );

        let tree = loader_for(files).load("scenes/main.json").await.expect("load failed");

        assert_eq!(tree.root_name(), "Main");
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.uri.as_deref(), Some("scenes/main.json"));
        assert_eq!(tree.metadata["name"], "Test scene");

        let desk = tree.find_by_name("Desk").expect("Desk missing");
        let lamp = tree.find_by_name("Lamp").expect("Lamp missing");
        assert_eq!(tree.get(lamp).unwrap().parent, Some(desk));
        assert!(tree.get(desk).unwrap().save_entity);
        assert!(!tree.get(desk).unwrap().save_parent);
        assert!(tree.get(lamp).unwrap().save_parent);
        assert_eq!(
            tree.get(desk).unwrap().component("geometry").unwrap().props["kind"],
            "box"
        );
    }

    #[tokio::test]
    async fn test_sibling_order_follows_index() {
        let files = MemoryFileAccess::new();
        files.put(
            "main.json",
            json!({
                "root": "Main",
                "entities": {
                    "Desk": {},
                    "B": { "parent": "Desk", "index": 1 },
                    "A": { "parent": "Desk", "index": 0 }
                }
            })
            .to_string(),
        );

        let tree = loader_for(files).load("main.json").await.expect("load failed");
        let desk = tree.find_by_name("Desk").unwrap();
        let order: Vec<String> = tree
            .children(desk)
            .map(|id| tree.get(id).unwrap().name.clone())
            .collect();
        assert_eq!(order, ["A", "B"]);
    }

    #[tokio::test]
    async fn test_missing_parent_synthesizes_placeholder() {
        let files = MemoryFileAccess::new();
        files.put(
            "main.json",
            json!({
                "root": "Main",
                "entities": {
                    "Chair": { "parent": "Ghost", "index": 0 }
                }
            })
            .to_string(),
        );

        let tree = loader_for(files).load("main.json").await.expect("load must not fail");

        let ghost = tree.find_by_name("Ghost").expect("placeholder missing");
        assert!(tree.get(ghost).unwrap().missing);
        assert!(tree.has_missing_nodes());

        let chair = tree.find_by_name("Chair").unwrap();
        assert_eq!(tree.get(chair).unwrap().parent, Some(ghost));
    }

    #[tokio::test]
    async fn test_inheritance_overlay() {
        let files = MemoryFileAccess::new();
        files.put(
            "scenes/base.json",
            json!({
                "root": "Base",
                "entities": {
                    "Table": { "components": [{ "name": "geometry", "props": { "kind": "table" } }] },
                    "Rug": {}
                }
            })
            .to_string(),
        );
        files.put(
            "scenes/office.json",
            json!({
                "inherits": "base.json",
                "entities": {
                    "Table": { "staticMode": "static" },
                    "Lamp": { "parent": "Table", "index": 0 }
                }
            })
            .to_string(),
        );

        let tree = loader_for(files).load("scenes/office.json").await.expect("load failed");

        assert_eq!(tree.inherits_from.as_deref(), Some("scenes/base.json"));
        assert_eq!(tree.ancestors, ["scenes/base.json"]);

        let table = tree.find_by_name("Table").expect("Table missing");
        let table_node = tree.get(table).unwrap();
        assert_eq!(table_node.static_mode, StaticMode::Static);
        // Declared by the root document, so baseline stays Inherits.
        assert_eq!(table_node.original_static_mode, StaticMode::Inherits);
        assert!(table_node.save_entity);
        // Inherited component survives the overlay.
        assert_eq!(table_node.component("geometry").unwrap().props["kind"], "table");

        let children: Vec<String> = tree
            .children(table)
            .map(|id| tree.get(id).unwrap().name.clone())
            .collect();
        assert_eq!(children, ["Lamp"]);

        // Untouched ancestor entity is present but not save-worthy.
        let rug = tree.find_by_name("Rug").expect("Rug missing");
        assert!(!tree.get(rug).unwrap().save_entity);

        // Static propagates to the new child.
        let lamp = tree.find_by_name("Lamp").unwrap();
        assert_eq!(tree.get(lamp).unwrap().resolved_static, StaticMode::Static);
    }

    #[tokio::test]
    async fn test_two_level_inheritance_chain() {
        let files = MemoryFileAccess::new();
        files.put(
            "base/root.json",
            json!({ "root": "Root", "entities": { "Floor": {} } }).to_string(),
        );
        files.put(
            "base/mid.json",
            json!({ "inherits": "root.json", "entities": { "Wall": {} } }).to_string(),
        );
        files.put(
            "site/leaf.json",
            json!({ "inherits": "../base/mid.json", "entities": { "Door": {} } }).to_string(),
        );

        let tree = loader_for(files).load("site/leaf.json").await.expect("load failed");

        assert_eq!(tree.inherits_from.as_deref(), Some("base/mid.json"));
        assert_eq!(tree.ancestors, ["base/mid.json", "base/root.json"]);
        for name in ["Floor", "Wall", "Door"] {
            assert!(tree.find_by_name(name).is_some(), "{name} missing");
        }
        // Only the leaf document's entity is save-worthy.
        let door = tree.find_by_name("Door").unwrap();
        let wall = tree.find_by_name("Wall").unwrap();
        assert!(tree.get(door).unwrap().save_entity);
        assert!(!tree.get(wall).unwrap().save_entity);
    }

    #[tokio::test]
    async fn test_ancestor_static_becomes_baseline() {
        let files = MemoryFileAccess::new();
        files.put(
            "base.json",
            json!({ "root": "Base", "entities": { "Statue": { "staticMode": "static" } } })
                .to_string(),
        );
        files.put(
            "main.json",
            json!({ "inherits": "base.json", "entities": { "Statue": {} } }).to_string(),
        );

        let tree = loader_for(files).load("main.json").await.expect("load failed");
        let statue = tree.get(tree.find_by_name("Statue").unwrap()).unwrap();
        assert_eq!(statue.static_mode, StaticMode::Static);
        assert_eq!(statue.original_static_mode, StaticMode::Static);
    }

    #[tokio::test]
    async fn test_src_component_inflation_and_merge() {
        let files = MemoryFileAccess::new();
        files.put(
            "base.json",
            json!({
                "root": "Base",
                "entities": {
                    "Desk": {
                        "components": [{ "name": "material", "props": { "color": "oak", "gloss": 0.2 } }]
                    }
                }
            })
            .to_string(),
        );
        files.put(
            "main.json",
            json!({
                "inherits": "base.json",
                "entities": {
                    "Desk": { "components": [{ "name": "material", "src": "materials/pine.json" }] }
                }
            })
            .to_string(),
        );
        files.put("materials/pine.json", json!({ "color": "pine" }).to_string());

        let tree = loader_for(files).load("main.json").await.expect("load failed");
        let desk = tree.get(tree.find_by_name("Desk").unwrap()).unwrap();
        let material = desk.component("material").unwrap();

        // Fetched value merged over the ancestor's inflated props.
        assert_eq!(material.props["color"], "pine");
        assert_eq!(material.props["gloss"], 0.2);
        assert_eq!(material.src.as_deref(), Some("materials/pine.json"));
    }

    #[tokio::test]
    async fn test_unreachable_src_degrades_to_empty_props() {
        let files = MemoryFileAccess::new();
        files.put(
            "main.json",
            json!({
                "root": "Main",
                "entities": {
                    "Desk": { "components": [{ "name": "material", "src": "gone.json" }] }
                }
            })
            .to_string(),
        );

        let tree = loader_for(files).load("main.json").await.expect("load must not fail");
        let desk = tree.get(tree.find_by_name("Desk").unwrap()).unwrap();
        let material = desk.component("material").unwrap();
        assert_eq!(material.props, json!({}));
        assert_eq!(material.src.as_deref(), Some("gone.json"));
    }

    #[tokio::test]
    async fn test_transform_component_decodes() {
        let files = MemoryFileAccess::new();
        files.put(
            "main.json",
            json!({
                "root": "Main",
                "entities": {
                    "Desk": {
                        "components": [{
                            "name": "transform",
                            "props": { "position": [1.0, 2.0, 3.0], "scale": 2.0 }
                        }]
                    }
                }
            })
            .to_string(),
        );

        let tree = loader_for(files).load("main.json").await.expect("load failed");
        let desk = tree.get(tree.find_by_name("Desk").unwrap()).unwrap();
        assert_eq!(desk.local_transform.position, glam::Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(desk.local_transform.scale, 2.0);
    }

    #[tokio::test]
    async fn test_unreachable_document_is_fatal() {
        let files = MemoryFileAccess::new();
        let err = loader_for(files).load("missing.json").await.unwrap_err();
        match err {
            Error::SceneLoader { url, .. } => assert_eq!(url, "missing.json"),
            other => panic!("expected SceneLoader, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_damaged_document_is_fatal() {
        let files = MemoryFileAccess::new();
        files.put("broken.json", "{ definitely not json");
        let err = loader_for(files).load("broken.json").await.unwrap_err();
        assert!(matches!(err, Error::SceneLoader { .. }));
    }

    #[tokio::test]
    async fn test_neither_root_nor_inherits_is_config_error() {
        let files = MemoryFileAccess::new();
        files.put("empty.json", json!({ "entities": {} }).to_string());
        let err = loader_for(files).load("empty.json").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_unreachable_ancestor_is_fatal() {
        let files = MemoryFileAccess::new();
        files.put(
            "main.json",
            json!({ "inherits": "gone.json", "entities": {} }).to_string(),
        );
        let err = loader_for(files).load("main.json").await.unwrap_err();
        match err {
            Error::SceneLoader { url, .. } => assert_eq!(url, "gone.json"),
            other => panic!("expected SceneLoader, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_token_aborts_load() {
        let files = MemoryFileAccess::new();
        files.put("main.json", json!({ "root": "Main" }).to_string());

        let cancel = CancelToken::new();
        cancel.cancel();
        let loader = loader_for(files).with_cancel_token(cancel);

        let err = loader.load("main.json").await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[tokio::test]
    async fn test_model_uri_wraps_single_entity() {
        struct StubModels;
        impl ModelLoader for StubModels {
            fn load_model<'a>(&'a self, _uri: &'a str) -> BoxFuture<'a, Result<LoadedModel>> {
                Box::pin(async {
                    Ok(LoadedModel {
                        name: "Chair".into(),
                        animations: vec!["Idle".into()],
                    })
                })
            }
        }

        let files = MemoryFileAccess::new();
        let loader = loader_for(files).with_model_loader(Arc::new(StubModels));
        let tree = loader.load("models/chair.glb").await.expect("load failed");

        assert_eq!(tree.root_name(), "chair");
        let chair = tree.get(tree.find_by_name("Chair").unwrap()).unwrap();
        let model = chair.component("model").unwrap();
        assert_eq!(model.src.as_deref(), Some("models/chair.glb"));
        assert_eq!(model.props["animations"][0], "Idle");
    }

    #[tokio::test]
    async fn test_load_emits_scene_loaded() {
        let files = MemoryFileAccess::new();
        files.put("main.json", json!({ "root": "Main" }).to_string());

        let (sink, mut rx) = EventSink::channel();
        let loader = loader_for(files).with_events(sink);
        loader.load("main.json").await.expect("load failed");

        assert_eq!(
            rx.try_recv().unwrap(),
            SceneEvent::SceneLoaded { uri: "main.json".into() }
        );
    }

    #[test]
    fn test_handle_file_event_routing() {
        struct CountingCache(std::sync::Mutex<Vec<String>>);
        impl AssetCache for CountingCache {
            fn evict(&self, uri: &str) {
                self.0.lock().unwrap().push(uri.to_string());
            }
        }

        let cache = Arc::new(CountingCache(std::sync::Mutex::new(Vec::new())));
        let files = MemoryFileAccess::new();
        let mut loader = loader_for(files).with_cache(cache.clone());

        let scene = Some("scenes/main.json");
        let texture_changed = FileEvent::Changed { path: "textures/wood.png".into() };
        let scene_changed = FileEvent::Changed { path: "scenes/main.json".into() };

        assert_eq!(loader.handle_file_event(scene, &texture_changed), ChangeAction::Evicted);
        assert_eq!(cache.0.lock().unwrap().as_slice(), ["textures/wood.png"]);

        assert_eq!(loader.handle_file_event(scene, &scene_changed), ChangeAction::ReloadScene);

        // Armed suppression swallows exactly one event for the scene URI.
        loader.ignore_next_scene_file_change = true;
        assert_eq!(loader.handle_file_event(scene, &scene_changed), ChangeAction::Ignore);
        assert_eq!(loader.handle_file_event(scene, &scene_changed), ChangeAction::ReloadScene);
    }

    #[test]
    fn test_merge_json() {
        let mut target = json!({ "a": { "x": 1, "y": 2 }, "b": "keep" });
        merge_json(&mut target, &json!({ "a": { "y": 9, "z": 3 }, "c": true }));
        assert_eq!(target, json!({ "a": { "x": 1, "y": 9, "z": 3 }, "b": "keep", "c": true }));

        let mut target = json!({ "a": 1 });
        merge_json(&mut target, &Value::Null);
        assert_eq!(target, json!({ "a": 1 }));

        let mut target = json!("scalar");
        merge_json(&mut target, &json!(42));
        assert_eq!(target, json!(42));
    }
}
