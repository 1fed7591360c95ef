//! Disk-backed file access over tokio::fs.

use std::io;
use std::path::PathBuf;

use crate::scene::loader::{BoxFuture, FileAccess};

/// Reads and writes scene documents on the local filesystem. URIs are
/// interpreted as paths, optionally under a base directory.
pub struct DiskFileAccess {
    base_dir: Option<PathBuf>,
}

impl DiskFileAccess {
    /// Access paths as given.
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    /// Resolve relative URIs under `base_dir`.
    pub fn rooted(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn path_for(&self, uri: &str) -> PathBuf {
        match &self.base_dir {
            Some(base) if !uri.starts_with('/') => base.join(uri),
            _ => PathBuf::from(uri),
        }
    }
}

impl Default for DiskFileAccess {
    fn default() -> Self {
        Self::new()
    }
}

impl FileAccess for DiskFileAccess {
    fn read_text<'a>(&'a self, uri: &'a str) -> BoxFuture<'a, io::Result<String>> {
        let path = self.path_for(uri);
        Box::pin(async move { tokio::fs::read_to_string(&path).await })
    }

    fn write_text<'a>(&'a self, uri: &'a str, text: &'a str) -> BoxFuture<'a, io::Result<()>> {
        let path = self.path_for(uri);
        Box::pin(async move {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, text).await
        })
    }
}
