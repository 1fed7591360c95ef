//! In-memory file access, used by tests and tooling fixtures.

use std::collections::HashMap;
use std::io;
use std::sync::Mutex;

use crate::scene::loader::{BoxFuture, FileAccess};

/// A `FileAccess` backed by a map of URI → contents.
#[derive(Default)]
pub struct MemoryFileAccess {
    files: Mutex<HashMap<String, String>>,
}

impl MemoryFileAccess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a file.
    pub fn put(&self, uri: impl Into<String>, text: impl Into<String>) {
        self.files
            .lock()
            .expect("memory file lock poisoned")
            .insert(uri.into(), text.into());
    }

    /// Current contents of a file, if present.
    pub fn get(&self, uri: &str) -> Option<String> {
        self.files
            .lock()
            .expect("memory file lock poisoned")
            .get(uri)
            .cloned()
    }
}

impl FileAccess for MemoryFileAccess {
    fn read_text<'a>(&'a self, uri: &'a str) -> BoxFuture<'a, io::Result<String>> {
        let result = self.get(uri).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such file: {uri}"))
        });
        Box::pin(async move { result })
    }

    fn write_text<'a>(&'a self, uri: &'a str, text: &'a str) -> BoxFuture<'a, io::Result<()>> {
        self.put(uri, text);
        Box::pin(async move { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_read() {
        let files = MemoryFileAccess::new();
        files.put("a.json", "{}");
        assert_eq!(files.read_text("a.json").await.unwrap(), "{}");
        assert!(files.read_text("b.json").await.is_err());
    }

    #[tokio::test]
    async fn test_write_text_stores() {
        let files = MemoryFileAccess::new();
        files.write_text("out.json", "data").await.unwrap();
        assert_eq!(files.get("out.json").as_deref(), Some("data"));
    }
}
