#[cfg(feature = "transfer-presigned")]
use crate::PresignedTransfer;
#[cfg(feature = "transfer-s3")]
use crate::S3Transfer;
use crate::{ArtifactTransfer, TransferBackend, TransferError, TransferResult};
use qdrop_core::QDropConfig;
use std::sync::Arc;

/// Create a transfer backend based on configuration
pub fn create_transfer(config: &QDropConfig) -> TransferResult<Arc<dyn ArtifactTransfer>> {
    match config.transfer_backend {
        #[cfg(feature = "transfer-presigned")]
        TransferBackend::Presigned => {
            let broker_url = config.broker_url.clone().ok_or_else(|| {
                TransferError::ConfigError("QDROP_BROKER_URL not configured".to_string())
            })?;
            let transfer = PresignedTransfer::new(
                broker_url,
                config.public_base_url.clone(),
                std::time::Duration::from_secs(config.http_timeout_secs),
            )?;
            Ok(Arc::new(transfer))
        }

        #[cfg(not(feature = "transfer-presigned"))]
        TransferBackend::Presigned => Err(TransferError::ConfigError(
            "Presigned transfer backend not available (transfer-presigned feature not enabled)"
                .to_string(),
        )),

        #[cfg(feature = "transfer-s3")]
        TransferBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| TransferError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config.s3_region.clone().ok_or_else(|| {
                TransferError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let transfer = S3Transfer::new(bucket, region, config.s3_endpoint.clone())?
                .with_public_base_url(config.public_base_url.clone());
            Ok(Arc::new(transfer))
        }

        #[cfg(not(feature = "transfer-s3"))]
        TransferBackend::S3 => Err(TransferError::ConfigError(
            "S3 transfer backend not available (transfer-s3 feature not enabled)".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presigned_requires_broker_url() {
        let config = QDropConfig {
            transfer_backend: TransferBackend::Presigned,
            broker_url: None,
            ..QDropConfig::default()
        };
        assert!(matches!(
            create_transfer(&config),
            Err(TransferError::ConfigError(_))
        ));
    }

    #[cfg(feature = "transfer-presigned")]
    #[test]
    fn test_creates_presigned_backend() {
        let config = QDropConfig {
            transfer_backend: TransferBackend::Presigned,
            broker_url: Some("http://localhost:3000".to_string()),
            ..QDropConfig::default()
        };
        let transfer = create_transfer(&config).unwrap();
        assert_eq!(transfer.backend_type(), TransferBackend::Presigned);
    }

    #[test]
    fn test_s3_requires_bucket() {
        let config = QDropConfig {
            transfer_backend: TransferBackend::S3,
            s3_bucket: None,
            s3_region: Some("us-east-1".to_string()),
            ..QDropConfig::default()
        };
        assert!(matches!(
            create_transfer(&config),
            Err(TransferError::ConfigError(_))
        ));
    }
}
