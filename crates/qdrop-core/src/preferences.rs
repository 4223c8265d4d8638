//! Client-side preference persistence
//!
//! Preferences only prefill forms (last organization, label, submitter). They are never
//! authoritative: the organization is re-validated on every submit.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key-value store for form prefill values.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    async fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// Preferences kept in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.values.lock().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences stored as a JSON object in a file.
///
/// The whole map is rewritten on every `set` through a temporary file and a rename,
/// so a crash never leaves a truncated file behind.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FilePreferenceStore {
    /// Load preferences from `path`. A missing file starts empty; an unreadable one
    /// is logged and ignored.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match tokio::fs::read(&path).await {
            Ok(raw) => match serde_json::from_slice::<BTreeMap<String, String>>(&raw) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        path = %path.display(),
                        "Ignoring unreadable preferences file"
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "Failed to read preferences file"
                );
                BTreeMap::new()
            }
        };

        Self {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, values: &BTreeMap<String, String>) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(values)?;
        tokio::fs::write(&tmp_path, body).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for FilePreferenceStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.values.lock().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut values = self.values.lock().await;
        let mut staged = values.clone();
        staged.insert(key.to_string(), value.to_string());
        self.write(&staged).await?;
        *values = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryPreferenceStore::new();
        assert_eq!(store.get("org_id").await, None);
        store.set("org_id", "acme").await.unwrap();
        assert_eq!(store.get("org_id").await.as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let store = FilePreferenceStore::open(&path).await;
        store.set("label", "beta").await.unwrap();
        store.set("user", "sam").await.unwrap();

        let reopened = FilePreferenceStore::open(&path).await;
        assert_eq!(reopened.get("label").await.as_deref(), Some("beta"));
        assert_eq!(reopened.get("user").await.as_deref(), Some("sam"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_file_store_keeps_memory_unchanged_when_write_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        tokio::fs::write(&blocker, b"").await.unwrap();

        // The parent is a regular file, so the directory cannot be created.
        let store = FilePreferenceStore::open(blocker.join("prefs.json")).await;
        assert!(store.set("org_id", "acme").await.is_err());
        assert_eq!(store.get("org_id").await, None);
    }

    #[tokio::test]
    async fn test_file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        let store = FilePreferenceStore::open(&path).await;
        assert_eq!(store.get("org_id").await, None);
        store.set("org_id", "acme").await.unwrap();

        let reopened = FilePreferenceStore::open(&path).await;
        assert_eq!(reopened.get("org_id").await.as_deref(), Some("acme"));
    }
}
