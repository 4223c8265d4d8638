//! Error types module
//!
//! Every failure of a submit session is reported as an `UploadError`. Each variant
//! carries a stable `ErrorKind` and describes its own user-facing message through
//! `ErrorMetadata`, so callers never have to pattern-match to render a status line.

use serde::Serialize;

use crate::validation::ValidationError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a refused credential
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Stable classification of a failed session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Identity,
    Authorization,
    Transfer,
    Persistence,
    RecordNotFound,
    SessionInProgress,
}

/// Metadata for error reporting - defines how an error should be presented
pub trait ErrorMetadata {
    fn kind(&self) -> ErrorKind;

    /// Machine-readable error code (e.g., "TRANSFER_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether resubmitting without changing input may succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Validation failed: {}", join_violations(.0))]
    Validation(Vec<ValidationError>),

    #[error("Organization ID is required")]
    MissingOrganization,

    #[error("Organization not found: {0}")]
    OrganizationNotFound(String),

    #[error("Organization directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// The artifact is in storage but no record points at it.
    #[error("Artifact uploaded to {artifact_url} but metadata write failed: {reason}")]
    Persistence {
        artifact_url: String,
        reason: String,
    },

    /// The record chosen for replacement disappeared before the update.
    #[error("Replacement target {key} not found; artifact uploaded to {artifact_url}")]
    RecordNotFound { key: String, artifact_url: String },

    #[error("An upload is already in progress")]
    SessionInProgress,
}

fn join_violations(violations: &[ValidationError]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl UploadError {
    /// URL of an artifact that reached storage without being recorded, if any.
    pub fn orphaned_artifact_url(&self) -> Option<&str> {
        match self {
            UploadError::Persistence { artifact_url, .. }
            | UploadError::RecordNotFound { artifact_url, .. } => Some(artifact_url),
            _ => None,
        }
    }

    pub fn violations(&self) -> &[ValidationError] {
        match self {
            UploadError::Validation(violations) => violations,
            _ => &[],
        }
    }
}

/// Static metadata for each variant: (kind, error_code, recoverable, suggested_action, log_level).
fn upload_error_static_metadata(
    err: &UploadError,
) -> (
    ErrorKind,
    &'static str,
    bool,
    Option<&'static str>,
    LogLevel,
) {
    match err {
        UploadError::Validation(_) => (
            ErrorKind::Validation,
            "VALIDATION_FAILED",
            false,
            Some("Correct the highlighted fields and submit again"),
            LogLevel::Debug,
        ),
        UploadError::MissingOrganization => (
            ErrorKind::Identity,
            "ORGANIZATION_REQUIRED",
            false,
            Some("Enter your organization ID"),
            LogLevel::Debug,
        ),
        UploadError::OrganizationNotFound(_) => (
            ErrorKind::Identity,
            "ORGANIZATION_NOT_FOUND",
            false,
            Some("Contact your administrator for a valid organization ID"),
            LogLevel::Warn,
        ),
        UploadError::DirectoryUnavailable(_) => (
            ErrorKind::Identity,
            "DIRECTORY_UNAVAILABLE",
            true,
            Some("Check your connection and try again"),
            LogLevel::Error,
        ),
        UploadError::AuthorizationDenied(_) => (
            ErrorKind::Authorization,
            "AUTHORIZATION_DENIED",
            true,
            Some("Retry after a short delay"),
            LogLevel::Warn,
        ),
        UploadError::TransferFailed(_) => (
            ErrorKind::Transfer,
            "TRANSFER_FAILED",
            true,
            Some("Check your connection and resubmit"),
            LogLevel::Error,
        ),
        UploadError::Persistence { .. } => (
            ErrorKind::Persistence,
            "PERSISTENCE_FAILED",
            false,
            Some("Record the uploaded artifact manually or resubmit"),
            LogLevel::Error,
        ),
        UploadError::RecordNotFound { .. } => (
            ErrorKind::RecordNotFound,
            "RECORD_NOT_FOUND",
            false,
            Some("Resubmit without replacing the previous build"),
            LogLevel::Warn,
        ),
        UploadError::SessionInProgress => (
            ErrorKind::SessionInProgress,
            "SESSION_IN_PROGRESS",
            true,
            Some("Wait for the current upload to finish"),
            LogLevel::Debug,
        ),
    }
}

impl ErrorMetadata for UploadError {
    fn kind(&self) -> ErrorKind {
        upload_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        upload_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        upload_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        upload_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::Validation(violations) => join_violations(violations),
            UploadError::MissingOrganization => "Organization ID is required".to_string(),
            UploadError::OrganizationNotFound(_) => {
                "Invalid organization ID. Upload not allowed. Please contact your administrator."
                    .to_string()
            }
            UploadError::DirectoryUnavailable(_) => {
                "Error validating organization. Please try again.".to_string()
            }
            UploadError::AuthorizationDenied(reason) => {
                format!("Failed to get upload URL: {}", reason)
            }
            UploadError::TransferFailed(reason) => format!("Upload failed: {}", reason),
            UploadError::Persistence {
                artifact_url,
                reason,
            } => format!(
                "The file was uploaded to {} but the build was NOT recorded ({}). \
                 Record it manually or submit again.",
                artifact_url, reason
            ),
            UploadError::RecordNotFound { key, artifact_url } => format!(
                "The previous build {} no longer exists. The file was uploaded to {} but the \
                 build was NOT recorded. Submit again without replacing.",
                key, artifact_url
            ),
            UploadError::SessionInProgress => {
                "An upload is already in progress. Please wait for it to finish.".to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        upload_error_static_metadata(self).4
    }
}
