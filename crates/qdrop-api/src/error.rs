//! HTTP error responses
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`; every failure renders as an
//! `ErrorResponse` body with a stable code.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use qdrop_core::LogLevel;
use qdrop_storage::TransferError;
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to sign upload URL: {0}")]
    Signing(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BrokerError {
    /// (status, code, recoverable, suggested_action, log_level)
    fn metadata(&self) -> (StatusCode, &'static str, bool, Option<&'static str>, LogLevel) {
        match self {
            BrokerError::InvalidInput(_) => (
                StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                false,
                Some("Check the request body"),
                LogLevel::Debug,
            ),
            BrokerError::Signing(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SIGNING_FAILED",
                true,
                Some("Retry after a short delay"),
                LogLevel::Error,
            ),
            BrokerError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                true,
                None,
                LogLevel::Error,
            ),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.metadata().0
    }

    pub fn error_code(&self) -> &'static str {
        self.metadata().1
    }

    /// Input problems are echoed back; server-side failures are not.
    pub fn client_message(&self) -> String {
        match self {
            BrokerError::InvalidInput(msg) => msg.clone(),
            BrokerError::Signing(_) => "Failed to generate upload URL".to_string(),
            BrokerError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

/// Wrapper so broker errors can implement `IntoResponse`
#[derive(Debug)]
pub struct HttpAppError(pub BrokerError);

impl From<BrokerError> for HttpAppError {
    fn from(err: BrokerError) -> Self {
        HttpAppError(err)
    }
}

impl From<TransferError> for HttpAppError {
    fn from(err: TransferError) -> Self {
        let broker = match err {
            TransferError::AuthorizationDenied(msg) | TransferError::TransferFailed(msg) => {
                BrokerError::Signing(msg)
            }
            TransferError::ConfigError(msg) => BrokerError::Internal(msg),
            TransferError::IoError(e) => BrokerError::Internal(format!("IO error: {}", e)),
        };
        HttpAppError(broker)
    }
}

/// Convert JSON body deserialization failures into a 400 with our ErrorResponse format.
impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(BrokerError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

/// JSON body extractor that answers malformed bodies with an `ErrorResponse`.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

fn log_error(error: &BrokerError) {
    match error.metadata().4 {
        LogLevel::Debug => tracing::debug!(error = %error, code = error.error_code(), "Request failed"),
        LogLevel::Warn => tracing::warn!(error = %error, code = error.error_code(), "Request failed"),
        LogLevel::Error => tracing::error!(error = %error, code = error.error_code(), "Request failed"),
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let error = &self.0;
        let (status, code, recoverable, suggested_action, _) = error.metadata();

        log_error(error);

        let details = if is_production_env() {
            None
        } else {
            Some(error.to_string())
        };

        let body = Json(ErrorResponse {
            error: error.client_message(),
            details,
            code: code.to_string(),
            recoverable,
            suggested_action: suggested_action.map(String::from),
        });

        (status, body).into_response()
    }
}
