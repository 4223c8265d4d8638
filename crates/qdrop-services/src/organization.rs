use std::sync::Arc;

use qdrop_core::constants::PREF_ORG_ID;
use qdrop_core::{PreferenceStore, UploadError};
use qdrop_db::IdentityStore;

/// Remembers the user's organization and re-validates it whenever it changes.
#[derive(Clone)]
pub struct OrganizationService {
    identity: Arc<dyn IdentityStore>,
    preferences: Arc<dyn PreferenceStore>,
}

impl OrganizationService {
    pub fn new(identity: Arc<dyn IdentityStore>, preferences: Arc<dyn PreferenceStore>) -> Self {
        Self {
            identity,
            preferences,
        }
    }

    /// Last saved organization identifier, if any.
    pub async fn current(&self) -> Option<String> {
        self.preferences
            .get(PREF_ORG_ID)
            .await
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
    }

    /// Validate `organization_id` against the directory and remember it.
    ///
    /// Nothing is persisted unless the directory confirms the identifier.
    #[tracing::instrument(skip(self))]
    pub async fn save(&self, organization_id: &str) -> Result<String, UploadError> {
        let organization_id = organization_id.trim();
        if organization_id.is_empty() {
            return Err(UploadError::MissingOrganization);
        }

        match self.identity.exists(organization_id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(organization_id = %organization_id, "Organization not found");
                return Err(UploadError::OrganizationNotFound(organization_id.to_string()));
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to verify organization");
                return Err(UploadError::DirectoryUnavailable(e.to_string()));
            }
        }

        if let Err(e) = self.preferences.set(PREF_ORG_ID, organization_id).await {
            tracing::warn!(error = %e, "Failed to persist organization id");
        }

        tracing::info!(organization_id = %organization_id, "Organization saved");
        Ok(organization_id.to_string())
    }

    /// Replace the saved organization. Blank or unchanged input is a no-op and returns `false`.
    pub async fn update(&self, organization_id: &str) -> Result<bool, UploadError> {
        let organization_id = organization_id.trim();
        if organization_id.is_empty() || self.current().await.as_deref() == Some(organization_id) {
            return Ok(false);
        }

        self.save(organization_id).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use qdrop_core::{ErrorKind, ErrorMetadata, MemoryPreferenceStore};
    use qdrop_db::{DirectoryError, MemoryIdentityStore, StoreError};

    struct BrokenDirectory;

    #[async_trait]
    impl IdentityStore for BrokenDirectory {
        async fn exists(&self, _organization_id: &str) -> Result<bool, DirectoryError> {
            Err(DirectoryError::Unavailable(StoreError::Request(
                "connection refused".to_string(),
            )))
        }
    }

    fn service(identity: Arc<dyn IdentityStore>) -> (OrganizationService, Arc<MemoryPreferenceStore>) {
        let preferences = Arc::new(MemoryPreferenceStore::new());
        (
            OrganizationService::new(identity, preferences.clone()),
            preferences,
        )
    }

    #[tokio::test]
    async fn test_save_valid_organization() {
        let (service, _) = service(Arc::new(MemoryIdentityStore::new(["acme"])));

        assert_eq!(service.current().await, None);
        assert_eq!(service.save("  acme ").await.unwrap(), "acme");
        assert_eq!(service.current().await.as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn test_unknown_organization_is_not_persisted() {
        let (service, preferences) = service(Arc::new(MemoryIdentityStore::new(["acme"])));

        let err = service.save("ghost").await.unwrap_err();
        assert!(matches!(err, UploadError::OrganizationNotFound(ref id) if id == "ghost"));
        assert_eq!(err.kind(), ErrorKind::Identity);
        assert_eq!(preferences.get(PREF_ORG_ID).await, None);
    }

    #[tokio::test]
    async fn test_directory_failure_is_distinct() {
        let (service, _) = service(Arc::new(BrokenDirectory));

        let err = service.save("acme").await.unwrap_err();
        assert_eq!(err.error_code(), "DIRECTORY_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_blank_organization() {
        let (service, _) = service(Arc::new(MemoryIdentityStore::new(["acme"])));
        assert!(matches!(
            service.save("   ").await,
            Err(UploadError::MissingOrganization)
        ));
    }

    #[tokio::test]
    async fn test_update_skips_unchanged_and_blank() {
        let (service, _) = service(Arc::new(MemoryIdentityStore::new(["acme", "globex"])));
        service.save("acme").await.unwrap();

        assert!(!service.update("acme").await.unwrap());
        assert!(!service.update("").await.unwrap());
        assert!(service.update("globex").await.unwrap());
        assert_eq!(service.current().await.as_deref(), Some("globex"));
    }
}
