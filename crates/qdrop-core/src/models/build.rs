use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registry-assigned key of a build record, unique within its organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Metadata describing one uploaded artifact.
///
/// Field names follow the registry's camelCase documents. Aliases accept records
/// written by the older dashboard (`apkUrl`, `user`, `fileSize`, `isUpdate`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRecord {
    pub organization_id: String,
    pub version: String,
    pub label: String,
    #[serde(default)]
    pub changelog: String,
    #[serde(default, alias = "user", skip_serializing_if = "Option::is_none")]
    pub submitter_name: Option<String>,
    #[serde(alias = "apkUrl")]
    pub artifact_url: String,
    pub file_name: String,
    #[serde(alias = "fileSize")]
    pub file_size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, alias = "isUpdate")]
    pub is_replacement: bool,
}

/// Raw form fields as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildForm {
    pub version: String,
    pub label: String,
    pub changelog: String,
    pub submitter_name: String,
}

impl BuildForm {
    /// Copy of the form with surrounding whitespace removed from every field.
    pub fn trimmed(&self) -> Self {
        Self {
            version: self.version.trim().to_string(),
            label: self.label.trim().to_string(),
            changelog: self.changelog.trim().to_string(),
            submitter_name: self.submitter_name.trim().to_string(),
        }
    }
}

/// Result of a session that reached `Complete`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedUpload {
    /// Key of the created record, or of the record that was replaced.
    pub key: RecordKey,
    pub record: BuildRecord,
    pub message: String,
}
