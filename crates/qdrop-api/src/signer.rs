use std::time::Duration;

use async_trait::async_trait;
use qdrop_storage::{S3Transfer, TransferResult};

/// Produces presigned PUT URLs for object keys.
#[async_trait]
pub trait UrlSigner: Send + Sync {
    async fn sign_put(&self, object_key: &str, expires_in: Duration) -> TransferResult<String>;
}

#[async_trait]
impl UrlSigner for S3Transfer {
    async fn sign_put(&self, object_key: &str, expires_in: Duration) -> TransferResult<String> {
        self.presign_put(object_key, expires_in).await
    }
}
