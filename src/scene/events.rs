//! Scene mutation events.
//!
//! The tree and loader announce mutations through an `EventSink` so editor
//! layers can subscribe without the core depending on any UI framework.

use tokio::sync::mpsc;

/// Mutation and lifecycle notifications emitted by the tree and loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneEvent {
    NodeAdded { name: String },
    NodeRemoved { name: String },
    NodeRenamed { from: String, to: String },
    NodeReparented { name: String, new_parent: String },
    NodeChanged { name: String },
    SceneLoaded { uri: String },
    SceneSaved { uri: String },
}

/// Cloneable handle that forwards events to an optional subscriber.
#[derive(Clone, Debug, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<SceneEvent>>,
}

impl EventSink {
    /// Create a connected sink and its receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SceneEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that drops every event.
    pub fn disconnected() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: SceneEvent) {
        if let Some(tx) = &self.tx {
            // Receiver may be gone during teardown; dropped events are fine.
            let _ = tx.send(event);
        }
    }
}
