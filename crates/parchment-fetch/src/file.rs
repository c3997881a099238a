//! Local filesystem content resolver.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use parchment_core::{ParchmentError, Resolver, Result};

/// Maximum file size read into memory (8 MB).
const MAX_FILE_SIZE: u64 = 8 * 1024 * 1024;

/// Resolver reading content from a directory tree.
///
/// Content paths are confined to the root: absolute paths and paths with
/// `..` segments are rejected before the filesystem is touched.
pub struct FileResolver {
    root: PathBuf,
}

impl FileResolver {
    /// Create a resolver serving files under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Join a content path onto the root, refusing escapes.
    fn confined(&self, path: &str) -> Result<PathBuf> {
        let mut clean = PathBuf::new();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => clean.push(part),
                Component::CurDir => {},
                _ => {
                    return Err(ParchmentError::Resolve(format!(
                        "path escapes content root: {path}",
                    )));
                },
            }
        }
        if clean.as_os_str().is_empty() {
            return Err(ParchmentError::Resolve(format!(
                "empty content path: {path:?}",
            )));
        }
        Ok(self.root.join(clean))
    }
}

#[async_trait]
impl Resolver for FileResolver {
    async fn resolve(&self, path: &str) -> Result<String> {
        let full = self.confined(path)?;

        let meta = tokio::fs::metadata(&full).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                ParchmentError::Resolve(format!("failed to load {path}: not found"))
            },
            _ => ParchmentError::Io(e),
        })?;
        if !meta.is_file() {
            return Err(ParchmentError::Resolve(format!(
                "failed to load {path}: not a file",
            )));
        }
        if meta.len() > MAX_FILE_SIZE {
            return Err(ParchmentError::Resolve(format!(
                "failed to load {path}: file exceeds size limit",
            )));
        }

        Ok(tokio::fs::read_to_string(&full).await?)
    }
}
