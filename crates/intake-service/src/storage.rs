//! Object storage backends for denuncia records and attachments

use async_trait::async_trait;
use axum::body::Bytes;
use denuncias_common::{Error, Result};
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Write-once, key-addressed blob storage.
///
/// Implementations must refuse to overwrite an existing object and report
/// that as `Error::Conflict`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `path`
    async fn put(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<()>;

    /// Short human-readable description for startup logs
    fn describe(&self) -> String;
}

/// An object held by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

/// In-process store, used by tests and local runs without blob storage
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    fail_on: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that fails every write whose path ends with `suffix`
    pub fn failing_on(suffix: impl Into<String>) -> Self {
        Self {
            objects: Mutex::default(),
            fail_on: Some(suffix.into()),
        }
    }

    pub async fn get(&self, path: &str) -> Option<StoredObject> {
        self.objects.lock().await.get(path).cloned()
    }

    /// All stored paths in lexical order
    pub async fn paths(&self) -> Vec<String> {
        self.objects.lock().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<()> {
        if let Some(suffix) = &self.fail_on {
            if path.ends_with(suffix.as_str()) {
                return Err(Error::Storage(format!("simulated failure writing {}", path)));
            }
        }

        let mut objects = self.objects.lock().await;
        if objects.contains_key(path) {
            return Err(Error::Conflict(path.to_string()));
        }

        debug!("Stored {} bytes at {}", bytes.len(), path);
        objects.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory store".to_string()
    }
}
