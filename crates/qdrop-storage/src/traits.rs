//! Artifact transfer abstraction trait

use async_trait::async_trait;
use qdrop_core::models::ArtifactFile;
use qdrop_core::TransferBackend;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transfer operation errors
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for transfer operations
pub type TransferResult<T> = Result<T, TransferError>;

/// Progress callback: `(bytes_sent, bytes_total)`.
pub type ProgressFn<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

/// Time-limited permission to write one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationGrant {
    /// Key the object is written under
    pub object_key: String,
    /// Write endpoint; for presigned grants this carries the signature in its query string
    pub url: String,
    pub content_type: String,
}

/// Two-phase artifact transfer.
///
/// Implementations never retry: a failure surfaces immediately to the caller.
#[async_trait]
pub trait ArtifactTransfer: Send + Sync {
    /// Obtain a write credential for `object_name`.
    async fn request_authorization(
        &self,
        object_name: &str,
        content_type: &str,
    ) -> TransferResult<AuthorizationGrant>;

    /// Send the artifact using `grant` and return its public retrieval URL.
    ///
    /// `on_progress` is called at least once per provider progress tick and always
    /// with `(total, total)` before a successful return.
    async fn transfer(
        &self,
        file: &ArtifactFile,
        grant: &AuthorizationGrant,
        on_progress: ProgressFn<'_>,
    ) -> TransferResult<String>;

    /// Get the transfer backend type
    fn backend_type(&self) -> TransferBackend;
}
