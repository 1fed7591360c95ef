//! File-change notification channel for diorama.
//!
//! Polls watched paths for modification-time changes and emits `FileEvent`s
//! keyed by absolute path on an unbounded channel. The editor core routes
//! the events (reload the open scene, evict an asset cache entry); this
//! crate only reports what changed.
//!
//! Start a watcher inside a tokio runtime:
//! ```ignore
//! let (watcher, mut events) = FileWatcher::start(Duration::from_millis(500));
//! watcher.watch("scenes/main.json");
//! while let Some(event) = events.recv().await { /* route */ }
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;

/// A change observed on a watched path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    Changed { path: String },
    Removed { path: String },
}

impl FileEvent {
    /// The watched path this event refers to.
    pub fn path(&self) -> &str {
        match self {
            FileEvent::Changed { path } | FileEvent::Removed { path } => path,
        }
    }
}

#[derive(Default)]
struct WatchState {
    /// Last seen mtime per watched path; `None` while the file is absent.
    mtimes: HashMap<PathBuf, Option<SystemTime>>,
}

/// Poll-based file watcher.
///
/// Dropping the receiver stops the background task at its next tick.
pub struct FileWatcher {
    state: Arc<Mutex<WatchState>>,
    tx: mpsc::UnboundedSender<FileEvent>,
}

impl FileWatcher {
    /// Spawn the polling task on the current tokio runtime and return the
    /// watcher handle plus the event receiver.
    pub fn start(poll_interval: Duration) -> (Self, mpsc::UnboundedReceiver<FileEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            state: Arc::new(Mutex::new(WatchState::default())),
            tx,
        };

        let state = Arc::clone(&watcher.state);
        let tx = watcher.tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.is_closed() {
                    break;
                }
                for event in poll_once(&state).await {
                    if tx.send(event).is_err() {
                        return;
                    }
                }
            }
        });

        (watcher, rx)
    }

    /// Start watching a path. The current mtime is taken as the baseline,
    /// so watching an existing file does not emit a spurious change.
    pub fn watch(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mtime = std::fs::metadata(&path).ok().and_then(|m| m.modified().ok());
        log::debug!("watching {} (present: {})", path.display(), mtime.is_some());
        self.state
            .lock()
            .expect("watch state lock poisoned")
            .mtimes
            .insert(path, mtime);
    }

    /// Stop watching a path.
    pub fn unwatch(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.state
            .lock()
            .expect("watch state lock poisoned")
            .mtimes
            .remove(&path);
    }

    /// Number of watched paths.
    pub fn watched_count(&self) -> usize {
        self.state
            .lock()
            .expect("watch state lock poisoned")
            .mtimes
            .len()
    }
}

/// One polling pass: stat every watched path, emit events for differences,
/// and record the new baselines.
async fn poll_once(state: &Arc<Mutex<WatchState>>) -> Vec<FileEvent> {
    let snapshot: Vec<(PathBuf, Option<SystemTime>)> = {
        let guard = state.lock().expect("watch state lock poisoned");
        guard.mtimes.iter().map(|(p, m)| (p.clone(), *m)).collect()
    };

    let mut events = Vec::new();
    let mut updates = Vec::with_capacity(snapshot.len());
    for (path, previous) in snapshot {
        let current = tokio::fs::metadata(&path)
            .await
            .ok()
            .and_then(|m| m.modified().ok());
        let display = path.to_string_lossy().into_owned();
        match (previous, current) {
            (Some(_), None) => events.push(FileEvent::Removed { path: display }),
            (previous, Some(_)) if previous != current => {
                events.push(FileEvent::Changed { path: display })
            }
            _ => {}
        }
        updates.push((path, current));
    }

    let mut guard = state.lock().expect("watch state lock poisoned");
    for (path, mtime) in updates {
        // A path unwatched mid-poll stays unwatched.
        if let Some(entry) = guard.mtimes.get_mut(&path) {
            *entry = mtime;
        }
    }

    events
}
