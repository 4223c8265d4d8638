use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qdrop_core::models::{BuildRecord, RecordKey};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::client::{json_literal, DocumentClient};
use crate::error::RegistryError;

/// Store of build metadata, namespaced per organization.
#[async_trait]
pub trait BuildRegistry: Send + Sync {
    /// Append `record` under its organization and return the assigned key.
    async fn create(&self, record: &BuildRecord) -> Result<RecordKey, RegistryError>;

    /// Key of the record with the latest `uploaded_at` among those whose label equals `label`.
    async fn find_most_recent_by_label(
        &self,
        organization_id: &str,
        label: &str,
    ) -> Result<Option<RecordKey>, RegistryError>;

    /// Replace an existing record in place. Fields the new record does not carry are cleared.
    async fn update(&self, key: &RecordKey, record: &BuildRecord) -> Result<(), RegistryError>;
}

/// Pick the key with the maximum timestamp. Candidates must arrive in insertion order;
/// on equal timestamps the later one wins.
pub fn select_most_recent<I>(candidates: I) -> Option<RecordKey>
where
    I: IntoIterator<Item = (RecordKey, DateTime<Utc>)>,
{
    let mut best: Option<(RecordKey, DateTime<Utc>)> = None;
    for (key, uploaded_at) in candidates {
        match &best {
            Some((_, latest)) if uploaded_at < *latest => {}
            _ => best = Some((key, uploaded_at)),
        }
    }
    best.map(|(key, _)| key)
}

/// Accepts RFC 3339 strings and epoch-millisecond numbers.
fn parse_uploaded_at(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Registry backed by `{builds_path}/{organization_id}/{key}` documents.
#[derive(Clone, Debug)]
pub struct RemoteBuildRegistry {
    client: DocumentClient,
    builds_path: String,
}

impl RemoteBuildRegistry {
    pub fn new(client: DocumentClient, builds_path: impl Into<String>) -> Self {
        Self {
            client,
            builds_path: builds_path.into(),
        }
    }

    fn organization_path(&self, organization_id: &str) -> String {
        format!("{}/{}", self.builds_path, organization_id)
    }

    fn record_path(&self, organization_id: &str, key: &RecordKey) -> String {
        format!("{}/{}/{}", self.builds_path, organization_id, key)
    }
}

#[async_trait]
impl BuildRegistry for RemoteBuildRegistry {
    #[tracing::instrument(skip(self, record), fields(
        db.system = "document-store",
        organization_id = %record.organization_id,
        label = %record.label
    ))]
    async fn create(&self, record: &BuildRecord) -> Result<RecordKey, RegistryError> {
        let key = self
            .client
            .push(&self.organization_path(&record.organization_id), record)
            .await?;

        tracing::info!(key = %key, version = %record.version, "Build record created");
        Ok(key)
    }

    #[tracing::instrument(skip(self), fields(db.system = "document-store"))]
    async fn find_most_recent_by_label(
        &self,
        organization_id: &str,
        label: &str,
    ) -> Result<Option<RecordKey>, RegistryError> {
        let query = [
            ("orderBy", json_literal("label")),
            ("equalTo", json_literal(label)),
        ];

        // Generated keys sort chronologically, so map order is insertion order.
        let records: Option<BTreeMap<String, Value>> = self
            .client
            .get(&self.organization_path(organization_id), &query)
            .await?;

        let candidates = records.unwrap_or_default().into_iter().filter_map(|(key, doc)| {
            if doc.get("label").and_then(Value::as_str) != Some(label) {
                return None;
            }
            match doc.get("uploadedAt").and_then(parse_uploaded_at) {
                Some(uploaded_at) => Some((RecordKey::new(key), uploaded_at)),
                None => {
                    tracing::warn!(key = %key, "Skipping build record with unreadable uploadedAt");
                    None
                }
            }
        });

        let found = select_most_recent(candidates);
        tracing::debug!(found = ?found, "Resolved most recent build by label");
        Ok(found)
    }

    #[tracing::instrument(skip(self, record), fields(
        db.system = "document-store",
        organization_id = %record.organization_id,
        key = %key
    ))]
    async fn update(&self, key: &RecordKey, record: &BuildRecord) -> Result<(), RegistryError> {
        let path = self.record_path(&record.organization_id, key);

        // Writing to a missing path would create it, so check first.
        let existing: Option<Value> = self.client.get(&path, &[]).await?;
        if existing.is_none() {
            tracing::warn!("Replacement target no longer exists");
            return Err(RegistryError::RecordNotFound(key.clone()));
        }

        // A full write, so older field names and an absent submitter do not survive.
        self.client.set(&path, record).await?;
        tracing::info!(version = %record.version, "Build record updated");
        Ok(())
    }
}

/// In-memory registry. Keys are zero-padded sequence numbers so they sort in insertion order.
#[derive(Debug, Default)]
pub struct MemoryBuildRegistry {
    inner: Mutex<MemoryRegistryState>,
}

#[derive(Debug, Default)]
struct MemoryRegistryState {
    next_id: u64,
    builds: BTreeMap<String, BTreeMap<RecordKey, BuildRecord>>,
}

impl MemoryBuildRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records for an organization, in key order.
    pub async fn records(&self, organization_id: &str) -> Vec<(RecordKey, BuildRecord)> {
        self.inner
            .lock()
            .await
            .builds
            .get(organization_id)
            .map(|records| {
                records
                    .iter()
                    .map(|(k, r)| (k.clone(), r.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn remove(&self, organization_id: &str, key: &RecordKey) -> Option<BuildRecord> {
        self.inner
            .lock()
            .await
            .builds
            .get_mut(organization_id)
            .and_then(|records| records.remove(key))
    }
}

#[async_trait]
impl BuildRegistry for MemoryBuildRegistry {
    async fn create(&self, record: &BuildRecord) -> Result<RecordKey, RegistryError> {
        let mut state = self.inner.lock().await;
        state.next_id += 1;
        let key = RecordKey::new(format!("build-{:08}", state.next_id));
        state
            .builds
            .entry(record.organization_id.clone())
            .or_default()
            .insert(key.clone(), record.clone());
        Ok(key)
    }

    async fn find_most_recent_by_label(
        &self,
        organization_id: &str,
        label: &str,
    ) -> Result<Option<RecordKey>, RegistryError> {
        let state = self.inner.lock().await;
        let Some(records) = state.builds.get(organization_id) else {
            return Ok(None);
        };

        Ok(select_most_recent(
            records
                .iter()
                .filter(|(_, record)| record.label == label)
                .map(|(key, record)| (key.clone(), record.uploaded_at)),
        ))
    }

    async fn update(&self, key: &RecordKey, record: &BuildRecord) -> Result<(), RegistryError> {
        let mut state = self.inner.lock().await;
        match state
            .builds
            .get_mut(&record.organization_id)
            .and_then(|records| records.get_mut(key))
        {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(RegistryError::RecordNotFound(key.clone())),
        }
    }
}
