use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use chrono::{Duration, Utc};
use qdrop_core::models::{UploadUrlRequest, UploadUrlResponse};
use validator::Validate;

use crate::error::{BrokerError, HttpAppError, ValidatedJson};
use crate::state::AppState;

/// Object keys must be relative and stay inside the bucket.
fn validate_object_key(name: &str) -> Result<(), BrokerError> {
    if name.trim().is_empty() {
        return Err(BrokerError::InvalidInput("File name is required".to_string()));
    }
    if name.starts_with('/') || name.contains('\\') || name.split('/').any(|seg| seg == "..") {
        return Err(BrokerError::InvalidInput(format!(
            "Invalid file name: {}",
            name
        )));
    }
    Ok(())
}

/// Issue a presigned PUT URL for `fileName`
#[tracing::instrument(
    skip(state, request),
    fields(
        file_name = %request.file_name,
        file_type = %request.file_type,
        operation = "generate_upload_url"
    )
)]
pub async fn create_upload_url(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<UploadUrlRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request
        .validate()
        .map_err(|e| BrokerError::InvalidInput(e.to_string()))?;
    validate_object_key(&request.file_name)?;

    let presigned_url = state
        .signer
        .sign_put(&request.file_name, state.presign_expiry)
        .await?;

    let expires_at = Utc::now()
        + Duration::from_std(state.presign_expiry)
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

    tracing::info!(
        expires_in_secs = state.presign_expiry.as_secs(),
        "Presigned upload URL generated"
    );

    Ok(Json(UploadUrlResponse {
        presigned_url,
        object_key: Some(request.file_name),
        expires_at: Some(expires_at),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_object_key() {
        assert!(validate_object_key("acme_1.0_1712345678901.apk").is_ok());
        assert!(validate_object_key("builds/acme.apk").is_ok());
        assert!(validate_object_key("").is_err());
        assert!(validate_object_key("  ").is_err());
        assert!(validate_object_key("/etc/passwd").is_err());
        assert!(validate_object_key("../secret.apk").is_err());
        assert!(validate_object_key("a/../../b.apk").is_err());
        assert!(validate_object_key("a\\b.apk").is_err());
    }
}
