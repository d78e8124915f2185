//! Blob storage for raw documents, extracted text and evidence.
//!
//! URIs are relative paths under three prefixes (`raw/`, `text/`,
//! `evidence/`); the adapter maps a prefix onto a real location. Blobs are
//! write-once: every write mints a fresh UUID-based name.

use crate::error::BlobError;
use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

/// Narrow storage contract the pipeline depends on.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read raw bytes by URI.
    async fn read(&self, uri: &str) -> Result<Vec<u8>, BlobError>;

    /// Read a UTF-8 text blob by URI.
    async fn read_text(&self, uri: &str) -> Result<String, BlobError>;

    /// Store raw document bytes under `raw/<uuid><ext>`. Returns the URI.
    async fn write_raw(&self, ext: &str, bytes: &[u8]) -> Result<String, BlobError>;

    /// Store extracted text under `text/<candidate_id>_<uuid>.txt`.
    /// Returns the URI.
    async fn write_text(&self, candidate_id: &str, content: &str) -> Result<String, BlobError>;

    /// Store an evidence JSON blob under `evidence/<candidate_id>_<uuid>.json`.
    /// Returns the URI.
    async fn write_evidence(&self, candidate_id: &str, content: &str)
        -> Result<String, BlobError>;
}

/// Filesystem-backed blob store rooted at a base directory.
pub struct LocalBlobStore {
    base: PathBuf,
}

impl LocalBlobStore {
    /// Create the store, ensuring the three prefix directories exist.
    pub fn new(base_dir: &str) -> Result<Self, BlobError> {
        let base = PathBuf::from(crate::config::expand_tilde(base_dir));
        for prefix in ["raw", "text", "evidence"] {
            let dir = base.join(prefix);
            std::fs::create_dir_all(&dir).map_err(|e| BlobError::Io {
                uri: dir.to_string_lossy().to_string(),
                source: e,
            })?;
        }
        Ok(Self { base })
    }

    fn full_path(&self, uri: &str) -> PathBuf {
        self.base.join(uri)
    }

    async fn write_bytes(&self, uri: String, bytes: &[u8]) -> Result<String, BlobError> {
        let path = self.full_path(&uri);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| BlobError::Io {
                uri: uri.clone(),
                source: e,
            })?;
        Ok(uri)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn read(&self, uri: &str) -> Result<Vec<u8>, BlobError> {
        let path = self.full_path(uri);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(BlobError::NotFound {
                uri: uri.to_string(),
            }),
            Err(e) => Err(BlobError::Io {
                uri: uri.to_string(),
                source: e,
            }),
        }
    }

    async fn read_text(&self, uri: &str) -> Result<String, BlobError> {
        let bytes = self.read(uri).await?;
        String::from_utf8(bytes).map_err(|_| BlobError::NotUtf8 {
            uri: uri.to_string(),
        })
    }

    async fn write_raw(&self, ext: &str, bytes: &[u8]) -> Result<String, BlobError> {
        let uri = format!("raw/{}{ext}", Uuid::new_v4());
        self.write_bytes(uri, bytes).await
    }

    async fn write_text(&self, candidate_id: &str, content: &str) -> Result<String, BlobError> {
        let uri = format!("text/{candidate_id}_{}.txt", Uuid::new_v4());
        self.write_bytes(uri, content.as_bytes()).await
    }

    async fn write_evidence(
        &self,
        candidate_id: &str,
        content: &str,
    ) -> Result<String, BlobError> {
        let uri = format!("evidence/{candidate_id}_{}.json", Uuid::new_v4());
        self.write_bytes(uri, content.as_bytes()).await
    }
}

/// In-memory blob store for tests.
#[cfg(any(test, feature = "test-helpers"))]
pub struct MemoryBlobStore {
    blobs: std::sync::Mutex<std::collections::HashMap<String, Vec<u8>>>,
}

#[cfg(any(test, feature = "test-helpers"))]
impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            blobs: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.lock().expect("lock poisoned").len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self, uri: &str) -> Result<Vec<u8>, BlobError> {
        self.blobs
            .lock()
            .expect("lock poisoned")
            .get(uri)
            .cloned()
            .ok_or_else(|| BlobError::NotFound {
                uri: uri.to_string(),
            })
    }

    async fn read_text(&self, uri: &str) -> Result<String, BlobError> {
        let bytes = self.read(uri).await?;
        String::from_utf8(bytes).map_err(|_| BlobError::NotUtf8 {
            uri: uri.to_string(),
        })
    }

    async fn write_raw(&self, ext: &str, bytes: &[u8]) -> Result<String, BlobError> {
        let uri = format!("raw/{}{ext}", Uuid::new_v4());
        self.blobs
            .lock()
            .expect("lock poisoned")
            .insert(uri.clone(), bytes.to_vec());
        Ok(uri)
    }

    async fn write_text(&self, candidate_id: &str, content: &str) -> Result<String, BlobError> {
        let uri = format!("text/{candidate_id}_{}.txt", Uuid::new_v4());
        self.blobs
            .lock()
            .expect("lock poisoned")
            .insert(uri.clone(), content.as_bytes().to_vec());
        Ok(uri)
    }

    async fn write_evidence(
        &self,
        candidate_id: &str,
        content: &str,
    ) -> Result<String, BlobError> {
        let uri = format!("evidence/{candidate_id}_{}.json", Uuid::new_v4());
        self.blobs
            .lock()
            .expect("lock poisoned")
            .insert(uri.clone(), content.as_bytes().to_vec());
        Ok(uri)
    }
}
