use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use qdrop_core::{FilePreferenceStore, PreferenceStore, QDropConfig};
use qdrop_db::{DocumentClient, RemoteBuildRegistry, RemoteIdentityStore};
use qdrop_services::{OrganizationService, UploadOrchestrator};
use qdrop_storage::create_transfer;

/// Preferences file used when `QDROP_PREFERENCES_PATH` is unset, relative to `$HOME`.
const DEFAULT_PREFERENCES_FILE: &str = ".config/qdrop/preferences.json";

/// Where preferences live: the configured path, else under `$HOME`, else the working directory.
pub fn preferences_path(config: &QDropConfig, home: Option<PathBuf>) -> PathBuf {
    match (&config.preferences_path, home) {
        (Some(path), _) => path.clone(),
        (None, Some(home)) => home.join(DEFAULT_PREFERENCES_FILE),
        (None, None) => PathBuf::from("qdrop-preferences.json"),
    }
}

/// Services shared by every subcommand.
pub struct CliContext {
    pub config: QDropConfig,
    pub preferences: Arc<dyn PreferenceStore>,
    pub identity: Arc<RemoteIdentityStore>,
    pub organizations: OrganizationService,
    client: DocumentClient,
}

impl CliContext {
    /// Wire the directory and preference store. Enough for `org` commands.
    pub async fn new(config: QDropConfig) -> Result<Self> {
        let client = DocumentClient::from_config(&config)
            .context("Failed to configure the organization directory")?;
        let identity = Arc::new(RemoteIdentityStore::new(
            client.clone(),
            config.organizations_path.clone(),
        ));

        let path = preferences_path(&config, std::env::var_os("HOME").map(PathBuf::from));
        tracing::debug!(path = %path.display(), "Using preferences file");
        let preferences: Arc<dyn PreferenceStore> = Arc::new(FilePreferenceStore::open(path).await);

        let organizations = OrganizationService::new(identity.clone(), preferences.clone());

        Ok(Self {
            config,
            preferences,
            identity,
            organizations,
            client,
        })
    }

    /// Build an orchestrator with the configured transfer backend and registry.
    pub fn orchestrator(&self) -> Result<UploadOrchestrator> {
        self.config
            .validate_for_uploads()
            .context("Configuration is incomplete for uploads")?;

        let transfer = create_transfer(&self.config).context("Failed to configure transfer")?;
        let registry = Arc::new(RemoteBuildRegistry::new(
            self.client.clone(),
            self.config.builds_path.clone(),
        ));

        Ok(
            UploadOrchestrator::from_config(&self.config, self.identity.clone(), registry, transfer)
                .with_preferences(self.preferences.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_path_resolution() {
        let mut config = QDropConfig::default();
        assert_eq!(
            preferences_path(&config, Some(PathBuf::from("/home/dana"))),
            PathBuf::from("/home/dana/.config/qdrop/preferences.json")
        );
        assert_eq!(
            preferences_path(&config, None),
            PathBuf::from("qdrop-preferences.json")
        );

        config.preferences_path = Some(PathBuf::from("/tmp/prefs.json"));
        assert_eq!(
            preferences_path(&config, Some(PathBuf::from("/home/dana"))),
            PathBuf::from("/tmp/prefs.json")
        );
    }

    #[tokio::test]
    async fn test_context_requires_database_url() {
        let config = QDropConfig::default();
        assert!(CliContext::new(config).await.is_err());
    }

    #[tokio::test]
    async fn test_orchestrator_requires_transfer_settings() {
        let dir = tempfile::tempdir().unwrap();
        let config = QDropConfig {
            database_url: Some("https://db.example.com".to_string()),
            preferences_path: Some(dir.path().join("prefs.json")),
            broker_url: None,
            ..QDropConfig::default()
        };

        let context = CliContext::new(config).await.unwrap();
        assert!(context.orchestrator().is_err());
    }
}
