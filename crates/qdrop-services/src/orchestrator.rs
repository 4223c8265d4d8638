//! Upload orchestration
//!
//! `UploadOrchestrator::submit` runs one session through
//! `Validating → CheckingIdentity → [ResolvingReplacementTarget] → Transferring → Persisting → Complete`,
//! with `Failed` reachable from every step. Nothing is retried; every failure is returned
//! as an `UploadError` and reported to the progress sink with its client message.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use qdrop_core::constants::{PREF_LABEL, PREF_USER};
use qdrop_core::models::{
    ArtifactFile, BuildForm, BuildRecord, CompletedUpload, RecordKey, Session, UploadPhase,
    UploadProgress,
};
use qdrop_core::{
    ArtifactValidator, ErrorMetadata, LogLevel, PreferenceStore, QDropConfig, UploadError,
    ValidationError,
};
use qdrop_db::{BuildRegistry, IdentityStore, RegistryError};
use qdrop_storage::keys::generate_object_name;
use qdrop_storage::{ArtifactTransfer, TransferError};

use crate::progress::{self, ProgressSink, ProgressTracker};

/// Extension used for object names when the artifact has none.
const FALLBACK_EXTENSION: &str = "bin";

/// Sequences validation, identity verification, transfer and persistence for one
/// session at a time.
pub struct UploadOrchestrator {
    validator: ArtifactValidator,
    identity: Arc<dyn IdentityStore>,
    registry: Arc<dyn BuildRegistry>,
    transfer: Arc<dyn ArtifactTransfer>,
    preferences: Option<Arc<dyn PreferenceStore>>,
    in_flight: AtomicBool,
    status: Mutex<UploadProgress>,
}

/// Marks the orchestrator busy for its lifetime. Released on drop, including when the
/// submit future is dropped mid-transfer.
struct SessionGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SessionGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl UploadOrchestrator {
    pub fn new(
        validator: ArtifactValidator,
        identity: Arc<dyn IdentityStore>,
        registry: Arc<dyn BuildRegistry>,
        transfer: Arc<dyn ArtifactTransfer>,
    ) -> Self {
        Self {
            validator,
            identity,
            registry,
            transfer,
            preferences: None,
            in_flight: AtomicBool::new(false),
            status: Mutex::new(UploadProgress::idle()),
        }
    }

    pub fn from_config(
        config: &QDropConfig,
        identity: Arc<dyn IdentityStore>,
        registry: Arc<dyn BuildRegistry>,
        transfer: Arc<dyn ArtifactTransfer>,
    ) -> Self {
        Self::new(
            ArtifactValidator::from_config(config),
            identity,
            registry,
            transfer,
        )
    }

    /// Remember label and submitter after each completed upload.
    pub fn with_preferences(mut self, preferences: Arc<dyn PreferenceStore>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn validator(&self) -> &ArtifactValidator {
        &self.validator
    }

    /// Latest progress of the running session, or idle.
    pub fn status(&self) -> UploadProgress {
        self.status
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// A form prefilled with the last used label and submitter name.
    pub async fn prefill(&self) -> BuildForm {
        let mut form = BuildForm::default();
        if let Some(preferences) = &self.preferences {
            form.label = preferences.get(PREF_LABEL).await.unwrap_or_default();
            form.submitter_name = preferences.get(PREF_USER).await.unwrap_or_default();
        }
        form
    }

    /// Run one submit session.
    ///
    /// Fails with `SessionInProgress` without touching the running session if another
    /// submit has not finished yet.
    pub async fn submit(
        &self,
        session: Session,
        progress: &dyn ProgressSink,
    ) -> Result<CompletedUpload, UploadError> {
        let _guard = SessionGuard::acquire(&self.in_flight).ok_or_else(|| {
            tracing::debug!("Rejected submit while another session is running");
            UploadError::SessionInProgress
        })?;

        self.reset_status();
        let tracker = ProgressTracker::new(progress, &self.status);
        let result = self.run(&session, &tracker).await;

        match &result {
            Ok(done) => {
                tracker.emit(UploadPhase::Complete, progress::COMPLETE, done.message.clone());
                self.remember_form(&done.record).await;
            }
            Err(err) => {
                log_failure(err);
                tracker.fail(err.client_message());
            }
        }

        self.reset_status();
        result
    }

    fn reset_status(&self) {
        *self.status.lock().unwrap_or_else(|e| e.into_inner()) = UploadProgress::idle();
    }

    #[tracing::instrument(
        skip(self, session, tracker),
        fields(
            organization_id = session.organization().unwrap_or_default(),
            replace_previous = session.replace_previous
        )
    )]
    async fn run(
        &self,
        session: &Session,
        tracker: &ProgressTracker<'_>,
    ) -> Result<CompletedUpload, UploadError> {
        tracker.emit(UploadPhase::Validating, progress::VALIDATING, "Validating build...");
        let form = session.form.trimmed();
        self.validator
            .validate(&form, session.file.as_ref())
            .map_err(UploadError::Validation)?;
        let file = session
            .file
            .as_ref()
            .ok_or_else(|| UploadError::Validation(vec![ValidationError::MissingFile]))?;

        let organization_id = session
            .organization()
            .ok_or(UploadError::MissingOrganization)?;

        tracker.emit(
            UploadPhase::CheckingIdentity,
            progress::CHECKING_IDENTITY,
            "Verifying organization...",
        );
        self.verify_organization(organization_id).await?;

        let target = if session.replace_previous {
            tracker.emit(
                UploadPhase::ResolvingReplacementTarget,
                progress::RESOLVING_TARGET,
                "Resolving previous build...",
            );
            self.resolve_target(organization_id, &form.label).await
        } else {
            None
        };

        let artifact_url = self
            .transfer_artifact(organization_id, &form.version, file, tracker)
            .await?;

        tracker.emit(UploadPhase::Persisting, progress::TRANSFER_END, "Saving metadata...");
        let record = BuildRecord {
            organization_id: organization_id.to_string(),
            version: form.version.clone(),
            label: form.label.clone(),
            changelog: form.changelog.clone(),
            submitter_name: Some(form.submitter_name.clone()).filter(|s| !s.is_empty()),
            artifact_url,
            file_name: file.name.clone(),
            file_size_bytes: file.size,
            uploaded_at: Utc::now(),
            is_replacement: target.is_some(),
        };
        let key = self.persist(target, &record).await?;

        tracing::info!(
            key = %key,
            version = %record.version,
            label = %record.label,
            replaced = record.is_replacement,
            size_bytes = record.file_size_bytes,
            "Build uploaded"
        );

        Ok(CompletedUpload {
            message: format!(
                "Build {} uploaded successfully! Build ID: {}",
                record.version, key
            ),
            key,
            record,
        })
    }

    async fn verify_organization(&self, organization_id: &str) -> Result<(), UploadError> {
        match self.identity.exists(organization_id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(UploadError::OrganizationNotFound(
                organization_id.to_string(),
            )),
            Err(e) => Err(UploadError::DirectoryUnavailable(e.to_string())),
        }
    }

    /// A failed lookup is treated like "no previous build": the session creates a new record.
    async fn resolve_target(&self, organization_id: &str, label: &str) -> Option<RecordKey> {
        match self
            .registry
            .find_most_recent_by_label(organization_id, label)
            .await
        {
            Ok(Some(key)) => {
                tracing::debug!(key = %key, "Replacing previous build");
                Some(key)
            }
            Ok(None) => {
                tracing::debug!("No previous build with this label, creating a new record");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to resolve previous build, creating a new record");
                None
            }
        }
    }

    async fn transfer_artifact(
        &self,
        organization_id: &str,
        version: &str,
        file: &ArtifactFile,
        tracker: &ProgressTracker<'_>,
    ) -> Result<String, UploadError> {
        tracker.emit(
            UploadPhase::Transferring,
            progress::REQUESTING_AUTHORIZATION,
            "Getting upload URL...",
        );
        let extension = file
            .extension()
            .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
        let object_name = generate_object_name(
            organization_id,
            version,
            Utc::now().timestamp_millis(),
            &extension,
        );
        let grant = self
            .transfer
            .request_authorization(&object_name, &file.content_type)
            .await
            .map_err(authorization_error)?;

        tracker.emit(
            UploadPhase::Transferring,
            progress::TRANSFER_START,
            "Starting upload...",
        );
        let on_progress = |sent: u64, total: u64| tracker.transfer_tick(sent, total);
        let artifact_url = self
            .transfer
            .transfer(file, &grant, &on_progress)
            .await
            .map_err(transfer_error)?;

        tracker.emit(UploadPhase::Transferring, progress::TRANSFER_END, "Upload complete!");
        Ok(artifact_url)
    }

    async fn persist(
        &self,
        target: Option<RecordKey>,
        record: &BuildRecord,
    ) -> Result<RecordKey, UploadError> {
        match target {
            Some(key) => {
                self.registry
                    .update(&key, record)
                    .await
                    .map_err(|e| registry_error(e, &record.artifact_url))?;
                Ok(key)
            }
            None => self
                .registry
                .create(record)
                .await
                .map_err(|e| registry_error(e, &record.artifact_url)),
        }
    }

    async fn remember_form(&self, record: &BuildRecord) {
        let Some(preferences) = &self.preferences else {
            return;
        };

        let mut values = vec![(PREF_LABEL, record.label.as_str())];
        if let Some(user) = &record.submitter_name {
            values.push((PREF_USER, user.as_str()));
        }
        for (key, value) in values {
            if let Err(e) = preferences.set(key, value).await {
                tracing::warn!(error = %e, key, "Failed to save form preference");
            }
        }
    }
}

fn authorization_error(err: TransferError) -> UploadError {
    match err {
        TransferError::AuthorizationDenied(reason) => UploadError::AuthorizationDenied(reason),
        other => UploadError::AuthorizationDenied(other.to_string()),
    }
}

fn transfer_error(err: TransferError) -> UploadError {
    match err {
        TransferError::TransferFailed(reason) => UploadError::TransferFailed(reason),
        other => UploadError::TransferFailed(other.to_string()),
    }
}

fn registry_error(err: RegistryError, artifact_url: &str) -> UploadError {
    match err {
        RegistryError::RecordNotFound(key) => UploadError::RecordNotFound {
            key: key.to_string(),
            artifact_url: artifact_url.to_string(),
        },
        RegistryError::Store(e) => UploadError::Persistence {
            artifact_url: artifact_url.to_string(),
            reason: e.to_string(),
        },
    }
}

fn log_failure(err: &UploadError) {
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(error = %err, code = err.error_code(), "Upload failed"),
        LogLevel::Warn => tracing::warn!(error = %err, code = err.error_code(), "Upload failed"),
        LogLevel::Error => tracing::error!(
            error = %err,
            code = err.error_code(),
            orphaned_url = err.orphaned_artifact_url(),
            "Upload failed"
        ),
    }
}
