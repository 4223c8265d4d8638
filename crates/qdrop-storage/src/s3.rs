use std::time::Duration;

use async_trait::async_trait;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload, Result as ObjectResult};
use qdrop_core::models::ArtifactFile;
use qdrop_core::TransferBackend;

use crate::keys::encode_object_key;
use crate::traits::{
    ArtifactTransfer, AuthorizationGrant, ProgressFn, TransferError, TransferResult,
};

/// Direct S3 transfer using credentials from the environment
#[derive(Clone, Debug)]
pub struct S3Transfer {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
    public_base_url: Option<String>,
}

impl S3Transfer {
    /// Create a new S3Transfer
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO, "https://<account>.r2.cloudflarestorage.com" for R2)
    pub fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> TransferResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| TransferError::ConfigError(e.to_string()))?;

        Ok(Self {
            store,
            bucket,
            region,
            endpoint_url,
            public_base_url: None,
        })
    }

    /// Serve retrieval URLs from a public origin instead of the bucket endpoint.
    pub fn with_public_base_url(mut self, public_base_url: Option<String>) -> Self {
        self.public_base_url = public_base_url;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Sign a PUT URL for `key` valid for `expires_in`.
    pub async fn presign_put(&self, key: &str, expires_in: Duration) -> TransferResult<String> {
        let location = Path::from(key.to_string());
        let url_result: ObjectResult<_> = self
            .store
            .signed_url(Method::PUT, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| TransferError::AuthorizationDenied(e.to_string()))?
            .to_string();

        Ok(url)
    }

    /// Public URL for an object
    ///
    /// With a public origin: {public}/{key}
    /// With a custom endpoint: {endpoint}/{bucket}/{key}
    /// Otherwise the AWS virtual-hosted form: https://{bucket}.s3.{region}.amazonaws.com/{key}
    fn generate_url(&self, key: &str) -> String {
        let key = encode_object_key(key);
        if let Some(ref public) = self.public_base_url {
            format!("{}/{}", public.trim_end_matches('/'), key)
        } else if let Some(ref endpoint) = self.endpoint_url {
            format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }
}

#[async_trait]
impl ArtifactTransfer for S3Transfer {
    async fn request_authorization(
        &self,
        object_name: &str,
        content_type: &str,
    ) -> TransferResult<AuthorizationGrant> {
        // Credentials are local, so the grant is just the target location.
        Ok(AuthorizationGrant {
            object_key: object_name.to_string(),
            url: self.generate_url(object_name),
            content_type: content_type.to_string(),
        })
    }

    #[tracing::instrument(
        skip(self, file, grant, on_progress),
        fields(transfer.backend = "s3", bucket = %self.bucket, key = %grant.object_key)
    )]
    async fn transfer(
        &self,
        file: &ArtifactFile,
        grant: &AuthorizationGrant,
        on_progress: ProgressFn<'_>,
    ) -> TransferResult<String> {
        let start = std::time::Instant::now();
        let bytes = file.read_all().await?;
        let size = bytes.len() as u64;
        let location = Path::from(grant.object_key.clone());

        on_progress(0, size);

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, grant.content_type.clone().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, PutPayload::from(bytes), options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            TransferError::TransferFailed(e.to_string())
        })?;

        on_progress(size, size);

        let url = self.generate_url(&grant.object_key);

        tracing::info!(
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(url)
    }

    fn backend_type(&self) -> TransferBackend {
        TransferBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(endpoint: Option<&str>) -> S3Transfer {
        S3Transfer::new(
            "qdrop-builds".to_string(),
            "us-east-1".to_string(),
            endpoint.map(String::from),
        )
        .unwrap()
    }

    #[test]
    fn test_generate_url_aws() {
        assert_eq!(
            transfer(None).generate_url("acme_1.0_1.apk"),
            "https://qdrop-builds.s3.us-east-1.amazonaws.com/acme_1.0_1.apk"
        );
    }

    #[test]
    fn test_generate_url_custom_endpoint() {
        assert_eq!(
            transfer(Some("http://localhost:9000/")).generate_url("a.apk"),
            "http://localhost:9000/qdrop-builds/a.apk"
        );
    }

    #[test]
    fn test_generate_url_public_origin() {
        let transfer = transfer(Some("http://localhost:9000"))
            .with_public_base_url(Some("https://cdn.example.com".to_string()));
        assert_eq!(transfer.generate_url("a.apk"), "https://cdn.example.com/a.apk");
        assert_eq!(
            transfer.generate_url("acme_1.0 rc_1.apk"),
            "https://cdn.example.com/acme_1.0%20rc_1.apk"
        );
    }

    #[tokio::test]
    async fn test_request_authorization_is_local() {
        let grant = transfer(None)
            .request_authorization("acme_1.0_1.apk", "application/octet-stream")
            .await
            .unwrap();
        assert_eq!(grant.object_key, "acme_1.0_1.apk");
        assert!(grant.url.ends_with("/acme_1.0_1.apk"));
    }
}
