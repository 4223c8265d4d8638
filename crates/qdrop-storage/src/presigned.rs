use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use qdrop_core::models::{ArtifactFile, UploadUrlRequest, UploadUrlResponse};
use qdrop_core::TransferBackend;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client};
use tokio::sync::mpsc;

use crate::keys::derive_public_url;
use crate::traits::{
    ArtifactTransfer, AuthorizationGrant, ProgressFn, TransferError, TransferResult,
};

/// Path of the broker endpoint that issues presigned PUT URLs.
pub const UPLOAD_URL_PATH: &str = "/api/upload-url";

/// Transfer through a presigned URL obtained from the authorization broker
#[derive(Clone, Debug)]
pub struct PresignedTransfer {
    client: Client,
    broker_url: String,
    public_base_url: Option<String>,
    timeout: Duration,
}

impl PresignedTransfer {
    /// Create a new PresignedTransfer
    ///
    /// # Arguments
    /// * `broker_url` - Origin of the authorization broker (e.g. "https://qdrop.example.com")
    /// * `public_base_url` - Optional public origin used in retrieval URLs
    /// * `timeout` - Overall timeout for broker requests and connect timeout for transfers;
    ///   a running transfer is bounded only by the transport
    pub fn new(
        broker_url: String,
        public_base_url: Option<String>,
        timeout: Duration,
    ) -> TransferResult<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| TransferError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            broker_url: broker_url.trim_end_matches('/').to_string(),
            public_base_url,
            timeout,
        })
    }

    fn upload_url_endpoint(&self) -> String {
        format!("{}{}", self.broker_url, UPLOAD_URL_PATH)
    }
}

#[async_trait]
impl ArtifactTransfer for PresignedTransfer {
    #[tracing::instrument(skip(self), fields(transfer.backend = "presigned"))]
    async fn request_authorization(
        &self,
        object_name: &str,
        content_type: &str,
    ) -> TransferResult<AuthorizationGrant> {
        let request = UploadUrlRequest {
            file_name: object_name.to_string(),
            file_type: content_type.to_string(),
        };

        let response = self
            .client
            .post(self.upload_url_endpoint())
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Authorization broker unreachable");
                TransferError::AuthorizationDenied(format!("broker unreachable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                body = %error_text,
                "Authorization broker refused upload URL"
            );
            return Err(TransferError::AuthorizationDenied(status_reason(status)));
        }

        let body: UploadUrlResponse = response.json().await.map_err(|e| {
            TransferError::AuthorizationDenied(format!("invalid broker response: {}", e))
        })?;

        tracing::debug!(expires_at = ?body.expires_at, "Received presigned upload URL");

        Ok(AuthorizationGrant {
            object_key: body.object_key.unwrap_or_else(|| object_name.to_string()),
            url: body.presigned_url,
            content_type: content_type.to_string(),
        })
    }

    #[tracing::instrument(
        skip(self, file, grant, on_progress),
        fields(
            transfer.backend = "presigned",
            object_key = %grant.object_key,
            size_bytes = file.size
        )
    )]
    async fn transfer(
        &self,
        file: &ArtifactFile,
        grant: &AuthorizationGrant,
        on_progress: ProgressFn<'_>,
    ) -> TransferResult<String> {
        let total = file.size;
        let start = std::time::Instant::now();

        // The body stream must be 'static, so byte counts travel back over a channel
        // and the callback runs here while the request is in flight.
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<u64>();
        let mut sent: u64 = 0;
        let body_stream = file.byte_stream().await?.map(move |chunk| {
            if let Ok(bytes) = &chunk {
                sent += bytes.len() as u64;
                let _ = progress_tx.send(sent);
            }
            chunk
        });

        on_progress(0, total);

        let request = self
            .client
            .put(&grant.url)
            .header(CONTENT_TYPE, grant.content_type.as_str())
            .header(CONTENT_LENGTH, total.to_string())
            .body(Body::wrap_stream(body_stream))
            .send();
        tokio::pin!(request);

        let result = loop {
            tokio::select! {
                Some(bytes_sent) = progress_rx.recv() => on_progress(bytes_sent, total),
                result = &mut request => break result,
            }
        };
        while let Ok(bytes_sent) = progress_rx.try_recv() {
            on_progress(bytes_sent, total);
        }

        let response = result.map_err(|e| {
            tracing::error!(
                error = %e,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Upload failed due to network error"
            );
            TransferError::TransferFailed(format!("network error: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(
                status = status.as_u16(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Storage rejected upload"
            );
            return Err(TransferError::TransferFailed(status_reason(status)));
        }

        on_progress(total, total);

        let url = derive_public_url(
            &grant.url,
            &grant.object_key,
            self.public_base_url.as_deref(),
        );

        tracing::info!(
            url = %url,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Artifact upload successful"
        );

        Ok(url)
    }

    fn backend_type(&self) -> TransferBackend {
        TransferBackend::Presigned
    }
}

fn status_reason(status: reqwest::StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("HTTP {} {}", status.as_u16(), reason),
        None => format!("HTTP {}", status.as_u16()),
    }
}
