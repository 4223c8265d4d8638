use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /api/upload-url`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    /// Proposed object name
    #[validate(length(
        min = 1,
        max = 512,
        message = "File name must be between 1 and 512 characters"
    ))]
    pub file_name: String,
    /// Content type the client will send with the PUT
    #[serde(default)]
    #[validate(length(max = 255, message = "File type must be at most 255 characters"))]
    pub file_type: String,
}

/// Presigned write credential issued by the broker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub presigned_url: String,
    /// Key the object will be stored under; older brokers omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}
