//! Where raw series blobs come from.
//!
//! The engine never speaks HTTP itself; it asks a [`DataSource`] for the
//! (possibly compressed) bytes of one label and handles the rest.
#![deny(missing_docs)]

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;

/// Fetch failures.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Underlying transport or I/O failure.
    #[error("transport error: {0}")]
    Transport(#[from] Box<dyn std::error::Error + Send + Sync>),
    /// The source did not answer in time.
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
    /// The source has no data for the label.
    #[error("no data for {0:?}")]
    NotFound(String),
    /// The label cannot be mapped onto the source.
    #[error("invalid label {0:?}")]
    InvalidLabel(String),
}

impl FetchError {
    /// Wrap any error as a transport failure.
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        FetchError::Transport(err.into())
    }
}

/// Supplier of raw series blobs.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch the raw bytes for `label`.
    async fn fetch_raw(&self, label: &str) -> Result<Vec<u8>>;
}

#[async_trait::async_trait]
impl<T: DataSource + ?Sized> DataSource for Arc<T> {
    async fn fetch_raw(&self, label: &str) -> Result<Vec<u8>> {
        (**self).fetch_raw(label).await
    }
}

/// In-memory source, for tests and for embedding pre-loaded data.
#[derive(Default, Clone)]
pub struct MemorySource {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemorySource {
    /// Empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `blob` under `label`, replacing any previous blob.
    pub async fn insert(&self, label: impl Into<String>, blob: Vec<u8>) {
        self.blobs.lock().await.insert(label.into(), blob);
    }

    /// Forget `label`.
    pub async fn remove(&self, label: &str) -> Option<Vec<u8>> {
        self.blobs.lock().await.remove(label)
    }
}

#[async_trait::async_trait]
impl DataSource for MemorySource {
    async fn fetch_raw(&self, label: &str) -> Result<Vec<u8>> {
        let blobs = self.blobs.lock().await;
        blobs
            .get(label)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(label.to_string()))
    }
}

/// One `<label>.bin` file per series under a root directory.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    /// File extension of series blobs.
    pub const EXTENSION: &'static str = "bin";

    /// Source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the blob for `label`. Labels must be a single plain path
    /// component so that they cannot escape the root.
    pub fn path_for(&self, label: &str) -> Result<PathBuf> {
        let mut components = Path::new(label).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if name.to_str() == Some(label) => {}
            _ => return Err(FetchError::InvalidLabel(label.to_string())),
        }
        Ok(self.root.join(format!("{label}.{}", Self::EXTENSION)))
    }
}

#[async_trait::async_trait]
impl DataSource for DirSource {
    async fn fetch_raw(&self, label: &str) -> Result<Vec<u8>> {
        let path = self.path_for(label)?;
        debug!(path = %path.display(), "reading series blob");
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(label.to_string()))
            }
            Err(e) => Err(FetchError::transport(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_source_rw() {
        let source = MemorySource::new();
        source.insert("speed", b"u8\n".to_vec()).await;
        assert_eq!(source.fetch_raw("speed").await.unwrap(), b"u8\n");
        assert!(matches!(
            source.fetch_raw("altitude").await,
            Err(FetchError::NotFound(l)) if l == "altitude"
        ));
        assert!(source.remove("speed").await.is_some());
        assert!(source.fetch_raw("speed").await.is_err());
    }

    #[tokio::test]
    async fn dir_source_reads_label_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rpm.bin"), b"u16\n").unwrap();
        let source = DirSource::new(dir.path());
        assert_eq!(source.fetch_raw("rpm").await.unwrap(), b"u16\n");
        assert!(matches!(
            source.fetch_raw("missing").await,
            Err(FetchError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn dir_source_rejects_escaping_labels() {
        let source = DirSource::new("/tmp/postal");
        for label in ["../etc/passwd", "a/b", "/abs", "..", ""] {
            assert!(
                matches!(source.fetch_raw(label).await, Err(FetchError::InvalidLabel(_))),
                "{label}"
            );
        }
        assert_eq!(
            source.path_for("engine.temp").unwrap(),
            PathBuf::from("/tmp/postal/engine.temp.bin")
        );
    }

    #[tokio::test]
    async fn shared_sources_delegate() {
        let source = Arc::new(MemorySource::new());
        source.insert("x", vec![1, 2, 3]).await;
        let dynamic: Arc<dyn DataSource> = source;
        assert_eq!(dynamic.fetch_raw("x").await.unwrap(), vec![1, 2, 3]);
    }
}
