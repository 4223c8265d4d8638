//! Configuration module
//!
//! Settings are read once at startup from the environment (after loading `.env`)
//! and never mutated afterwards.

use std::env;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_ALLOWED_EXTENSION, DEFAULT_BUILDS_PATH, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_MAX_FILE_SIZE_MB, DEFAULT_ORGANIZATIONS_PATH, DEFAULT_PRESIGN_EXPIRY_SECS,
};
use crate::transfer_types::TransferBackend;
use crate::validation::FormField;

const SERVER_PORT: u16 = 3000;

/// Application configuration shared by the CLI, the orchestrator and the broker.
#[derive(Clone, Debug)]
pub struct QDropConfig {
    pub environment: String,
    // Artifact validation
    pub allowed_extensions: Vec<String>,
    pub max_file_size_bytes: u64,
    /// Required on top of version and label.
    pub required_fields: Vec<FormField>,
    // Transfer
    pub transfer_backend: TransferBackend,
    pub broker_url: Option<String>,
    /// Public origin that replaces the storage origin in retrieval URLs (e.g. an r2.dev domain).
    pub public_base_url: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (R2, MinIO, ...)
    // Identity directory and build registry
    pub database_url: Option<String>,
    pub database_auth: Option<String>,
    pub organizations_path: String,
    pub builds_path: String,
    pub http_timeout_secs: u64,
    // Client preferences
    pub preferences_path: Option<PathBuf>,
    // Broker server
    pub server_port: u16,
    pub presign_expiry_secs: u64,
    pub cors_origins: Vec<String>,
}

impl Default for QDropConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            allowed_extensions: vec![DEFAULT_ALLOWED_EXTENSION.to_string()],
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024,
            required_fields: vec![FormField::Submitter],
            transfer_backend: TransferBackend::Presigned,
            broker_url: None,
            public_base_url: None,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            database_url: None,
            database_auth: None,
            organizations_path: DEFAULT_ORGANIZATIONS_PATH.to_string(),
            builds_path: DEFAULT_BUILDS_PATH.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            preferences_path: None,
            server_port: SERVER_PORT,
            presign_expiry_secs: DEFAULT_PRESIGN_EXPIRY_SECS,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl QDropConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or(defaults.environment);

        let allowed_extensions: Vec<String> = var("QDROP_ALLOWED_EXTENSIONS")
            .map(|s| {
                s.split(',')
                    .map(|e| e.trim().to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.allowed_extensions);

        let max_file_size_mb = match var("QDROP_MAX_FILE_SIZE_MB") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("QDROP_MAX_FILE_SIZE_MB must be a valid number"))?,
            None => DEFAULT_MAX_FILE_SIZE_MB,
        };

        let max_file_size_bytes = max_file_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("QDROP_MAX_FILE_SIZE_MB is too large"))?;

        let required_fields = match var("QDROP_REQUIRED_FIELDS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::parse::<FormField>)
                .collect::<Result<Vec<_>, _>>()?,
            None => defaults.required_fields,
        };

        let transfer_backend = match var("QDROP_TRANSFER_BACKEND") {
            Some(raw) => raw.parse()?,
            None => defaults.transfer_backend,
        };

        let server_port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            None => defaults.server_port,
        };

        Ok(Self {
            environment,
            allowed_extensions,
            max_file_size_bytes,
            required_fields,
            transfer_backend,
            broker_url: var("QDROP_BROKER_URL"),
            public_base_url: var("QDROP_PUBLIC_BASE_URL"),
            s3_bucket: var("S3_BUCKET"),
            s3_region: var("S3_REGION").or_else(|| var("AWS_REGION")),
            s3_endpoint: var("S3_ENDPOINT"),
            database_url: var("QDROP_DATABASE_URL"),
            database_auth: var("QDROP_DATABASE_AUTH"),
            organizations_path: var("QDROP_ORGANIZATIONS_PATH")
                .unwrap_or(defaults.organizations_path),
            builds_path: var("QDROP_BUILDS_PATH").unwrap_or(defaults.builds_path),
            http_timeout_secs: var("QDROP_HTTP_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.http_timeout_secs),
            preferences_path: var("QDROP_PREFERENCES_PATH").map(PathBuf::from),
            server_port,
            presign_expiry_secs: var("QDROP_PRESIGN_EXPIRY_SECS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.presign_expiry_secs),
            cors_origins: var("QDROP_CORS_ORIGINS")
                .map(|s| s.split(',').map(|o| o.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Settings needed to submit builds.
    pub fn validate_for_uploads(&self) -> Result<(), anyhow::Error> {
        if self.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!(
                "QDROP_ALLOWED_EXTENSIONS must list at least one extension"
            ));
        }
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("QDROP_MAX_FILE_SIZE_MB must be greater than 0"));
        }
        if self.database_url.is_none() {
            return Err(anyhow::anyhow!("QDROP_DATABASE_URL must be set"));
        }

        match self.transfer_backend {
            TransferBackend::Presigned if self.broker_url.is_none() => Err(anyhow::anyhow!(
                "QDROP_BROKER_URL must be set when QDROP_TRANSFER_BACKEND=presigned"
            )),
            TransferBackend::S3 => self.validate_s3(),
            _ => Ok(()),
        }
    }

    /// Settings needed to run the authorization broker.
    pub fn validate_for_broker(&self) -> Result<(), anyhow::Error> {
        if self.presign_expiry_secs == 0 {
            return Err(anyhow::anyhow!(
                "QDROP_PRESIGN_EXPIRY_SECS must be greater than 0"
            ));
        }
        self.validate_s3()
    }

    fn validate_s3(&self) -> Result<(), anyhow::Error> {
        if self.s3_bucket.is_none() {
            return Err(anyhow::anyhow!("S3_BUCKET must be set"));
        }
        if self.s3_region.is_none() {
            return Err(anyhow::anyhow!("S3_REGION or AWS_REGION must be set"));
        }
        Ok(())
    }
}
