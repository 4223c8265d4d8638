use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use qdrop_api::setup::server::start_server;
use qdrop_api::{setup_routes, telemetry, AppState};
use qdrop_core::QDropConfig;
use qdrop_storage::S3Transfer;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = QDropConfig::from_env()?;
    telemetry::init_tracing();
    config.validate_for_broker()?;

    let bucket = config.s3_bucket.clone().context("S3_BUCKET must be set")?;
    let region = config
        .s3_region
        .clone()
        .context("S3_REGION or AWS_REGION must be set")?;
    let signer = S3Transfer::new(bucket, region, config.s3_endpoint.clone())
        .context("Failed to configure S3 signer")?;

    let state = Arc::new(AppState::new(
        Arc::new(signer),
        Duration::from_secs(config.presign_expiry_secs),
    ));
    let router = setup_routes(&config, state);

    start_server(&config, router).await?;

    Ok(())
}
