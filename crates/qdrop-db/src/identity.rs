use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::client::{is_valid_key, DocumentClient};
use crate::error::DirectoryError;

/// Directory of organizations allowed to upload.
///
/// Lookups are never cached: revocations must take effect on the next call.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// `Ok(false)` means the directory answered and the organization is unknown.
    async fn exists(&self, organization_id: &str) -> Result<bool, DirectoryError>;
}

/// Directory backed by `{organizations_path}/{id}` documents.
#[derive(Clone, Debug)]
pub struct RemoteIdentityStore {
    client: DocumentClient,
    organizations_path: String,
}

impl RemoteIdentityStore {
    pub fn new(client: DocumentClient, organizations_path: impl Into<String>) -> Self {
        Self {
            client,
            organizations_path: organizations_path.into(),
        }
    }
}

#[async_trait]
impl IdentityStore for RemoteIdentityStore {
    #[tracing::instrument(skip(self), fields(db.system = "document-store", db.path = %self.organizations_path))]
    async fn exists(&self, organization_id: &str) -> Result<bool, DirectoryError> {
        let organization_id = organization_id.trim();
        if !is_valid_key(organization_id) {
            // Not addressable, so it cannot name a directory entry.
            tracing::debug!(organization_id = %organization_id, "Rejected malformed organization id");
            return Ok(false);
        }

        let path = format!("{}/{}", self.organizations_path, organization_id);
        let document: Option<Value> = self.client.get(&path, &[]).await.map_err(|e| {
            tracing::error!(error = %e, organization_id = %organization_id, "Organization lookup failed");
            DirectoryError::from(e)
        })?;

        let found = document.is_some_and(|doc| !doc.is_null());
        tracing::debug!(organization_id = %organization_id, found, "Organization lookup complete");
        Ok(found)
    }
}

/// In-memory directory
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    organizations: RwLock<HashSet<String>>,
}

impl MemoryIdentityStore {
    pub fn new<I, S>(organizations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            organizations: RwLock::new(organizations.into_iter().map(Into::into).collect()),
        }
    }

    pub async fn insert(&self, organization_id: impl Into<String>) {
        self.organizations.write().await.insert(organization_id.into());
    }

    /// Revoke an organization; later `exists` calls return false.
    pub async fn remove(&self, organization_id: &str) -> bool {
        self.organizations.write().await.remove(organization_id)
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn exists(&self, organization_id: &str) -> Result<bool, DirectoryError> {
        Ok(self
            .organizations
            .read()
            .await
            .contains(organization_id.trim()))
    }
}
