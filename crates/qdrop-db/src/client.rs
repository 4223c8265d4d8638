//! REST client for a realtime JSON document store.
//!
//! Every path maps to `{base}/{path}.json`. Reads of a missing path return JSON `null`,
//! `POST` appends a child under a server-generated key, and `PUT` replaces a document.

use std::time::Duration;

use qdrop_core::models::RecordKey;
use qdrop_core::QDropConfig;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

#[derive(Clone, Debug)]
pub struct DocumentClient {
    client: Client,
    base_url: String,
    auth: Option<String>,
}

impl DocumentClient {
    pub fn new(
        base_url: String,
        auth: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Build a client from `QDROP_DATABASE_URL` / `QDROP_DATABASE_AUTH`.
    pub fn from_config(config: &QDropConfig) -> Result<Self, StoreError> {
        let base_url = config
            .database_url
            .clone()
            .ok_or_else(|| StoreError::Config("QDROP_DATABASE_URL not configured".to_string()))?;

        Self::new(
            base_url,
            config.database_auth.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(token) => request.query(&[("auth", token.as_str())]),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Read the document at `path`. A missing document yields `None`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, StoreError> {
        let mut request = self.apply_auth(self.client.get(self.build_url(path)));
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = Self::check(request.send().await?).await?;
        let body: Option<T> = response.json().await?;
        Ok(body)
    }

    /// Append `value` under `path` and return the generated key.
    pub async fn push<B: Serialize + ?Sized>(
        &self,
        path: &str,
        value: &B,
    ) -> Result<RecordKey, StoreError> {
        let request = self.apply_auth(self.client.post(self.build_url(path)).json(value));
        let response = Self::check(request.send().await?).await?;
        let body: PushResponse = response.json().await?;
        Ok(RecordKey::new(body.name))
    }

    /// Replace the document at `path` with `value`. Fields absent from `value` are removed.
    pub async fn set<B: Serialize + ?Sized>(&self, path: &str, value: &B) -> Result<(), StoreError> {
        let request = self.apply_auth(self.client.put(self.build_url(path)).json(value));
        Self::check(request.send().await?).await?;
        Ok(())
    }
}

/// Quote a value for `orderBy`/`equalTo` query parameters, which take JSON literals.
pub fn json_literal(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Document store keys may not contain `.`, `$`, `#`, `[`, `]` or `/`.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(['.', '$', '#', '[', ']', '/'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::{json, Value};

    fn client(server: &mockito::Server, auth: Option<&str>) -> DocumentClient {
        DocumentClient::new(server.url(), auth.map(String::from), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_build_url() {
        let client =
            DocumentClient::new("https://db.example.com/".to_string(), None, Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            client.build_url("/builds/acme/"),
            "https://db.example.com/builds/acme.json"
        );
    }

    #[test]
    fn test_json_literal_and_keys() {
        assert_eq!(json_literal("beta"), "\"beta\"");
        assert!(is_valid_key("acme-42"));
        assert!(!is_valid_key("acme/42"));
        assert!(!is_valid_key("a.b"));
        assert!(!is_valid_key(""));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/organizations/ghost.json")
            .with_status(200)
            .with_body("null")
            .create_async()
            .await;

        let value: Option<Value> = client(&server, None)
            .get("organizations/ghost", &[])
            .await
            .unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_get_sends_auth() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/organizations/acme.json")
            .match_query(Matcher::UrlEncoded("auth".into(), "secret".into()))
            .with_status(200)
            .with_body(r#"{"name":"Acme"}"#)
            .create_async()
            .await;

        let value: Option<Value> = client(&server, Some("secret"))
            .get("organizations/acme", &[])
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(value, Some(json!({"name": "Acme"})));
    }

    #[tokio::test]
    async fn test_push_returns_generated_key() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/builds/acme.json")
            .match_body(Matcher::Json(json!({"label": "beta"})))
            .with_status(200)
            .with_body(r#"{"name":"-Nx1"}"#)
            .create_async()
            .await;

        let key = client(&server, None)
            .push("builds/acme", &json!({"label": "beta"}))
            .await
            .unwrap();
        assert_eq!(key, RecordKey::new("-Nx1"));
    }

    #[tokio::test]
    async fn test_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/builds/acme/-Nx1.json")
            .with_status(401)
            .with_body("Permission denied")
            .create_async()
            .await;

        let err = client(&server, None)
            .set("builds/acme/-Nx1", &json!({"label": "beta"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 401, .. }));
    }
}
