//! Terminal rendering of progress and failures.

use qdrop_core::models::{CompletedUpload, UploadProgress};
use qdrop_core::{ErrorMetadata, UploadError};

pub fn render_progress(progress: &UploadProgress) -> String {
    format!("[{:>3}%] {}", progress.percent, progress.message)
}

pub fn render_success(done: &CompletedUpload) -> String {
    format!("{}\nURL: {}", done.message, done.record.artifact_url)
}

/// User-facing message, error code, and any follow-up the user should take.
pub fn render_failure(err: &UploadError) -> String {
    // Violations are listed one per line below, so they are not repeated in the headline.
    let headline = if err.violations().is_empty() {
        err.client_message()
    } else {
        "Please fix the following:".to_string()
    };
    let mut lines = vec![format!("Error [{}]: {}", err.error_code(), headline)];

    for violation in err.violations() {
        lines.push(format!("  - {}", violation));
    }
    if let Some(url) = err.orphaned_artifact_url() {
        lines.push(format!("Uploaded artifact: {}", url));
    }
    if let Some(action) = err.suggested_action() {
        lines.push(format!("Suggestion: {}", action));
    }

    lines.join("\n")
}

/// Drops repeated updates so a fast transfer does not flood the terminal.
#[derive(Debug, Default)]
pub struct ProgressPrinter {
    last: Option<(u8, String)>,
}

impl ProgressPrinter {
    /// The line to print for `progress`, or `None` if nothing visible changed.
    pub fn line(&mut self, progress: &UploadProgress) -> Option<String> {
        let key = (progress.percent, progress.message.clone());
        if self.last.as_ref() == Some(&key) {
            return None;
        }
        self.last = Some(key);
        Some(render_progress(progress))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrop_core::models::UploadPhase;
    use qdrop_core::{FormField, ValidationError};

    fn progress(percent: u8, message: &str) -> UploadProgress {
        UploadProgress {
            phase: UploadPhase::Transferring,
            percent,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_render_progress() {
        assert_eq!(
            render_progress(&progress(45, "Uploading... 2.5MB / 5.0MB")),
            "[ 45%] Uploading... 2.5MB / 5.0MB"
        );
    }

    #[test]
    fn test_printer_skips_duplicates() {
        let mut printer = ProgressPrinter::default();
        assert!(printer.line(&progress(10, "Starting upload...")).is_some());
        assert!(printer.line(&progress(10, "Starting upload...")).is_none());
        assert!(printer.line(&progress(11, "Uploading...")).is_some());
    }

    #[test]
    fn test_render_failure_lists_violations() {
        let err = UploadError::Validation(vec![
            ValidationError::MissingField(FormField::Version),
            ValidationError::MissingFile,
        ]);
        let text = render_failure(&err);
        assert!(text.starts_with("Error [VALIDATION_FAILED]"));
        assert!(text.contains("  - Version is required"));
        assert!(text.contains("Suggestion:"));
        assert_eq!(text.matches("Version is required").count(), 1);
        assert_eq!(text.matches("Artifact file is required").count(), 1);
    }

    #[test]
    fn test_render_failure_shows_orphaned_artifact() {
        let err = UploadError::Persistence {
            artifact_url: "https://cdn.example.com/a.apk".to_string(),
            reason: "HTTP 503".to_string(),
        };
        assert!(render_failure(&err).contains("Uploaded artifact: https://cdn.example.com/a.apk"));
    }
}
