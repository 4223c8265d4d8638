use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use qdrop_core::models::{ArtifactFile, BuildRecord, RecordKey};
use qdrop_core::TransferBackend;
use qdrop_db::{
    BuildRegistry, DirectoryError, IdentityStore, MemoryBuildRegistry, RegistryError, StoreError,
};
use qdrop_storage::{
    ArtifactTransfer, AuthorizationGrant, ProgressFn, TransferError, TransferResult,
};
use tokio::sync::Notify;

pub const CDN: &str = "https://cdn.example.com";

/// Directory that answers from a fixed set, or fails every lookup.
pub struct FakeIdentity {
    known: HashSet<String>,
    unavailable: bool,
    pub calls: AtomicUsize,
}

impl FakeIdentity {
    pub fn known<const N: usize>(ids: [&str; N]) -> Self {
        Self {
            known: ids.iter().map(|s| s.to_string()).collect(),
            unavailable: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            known: HashSet::new(),
            unavailable: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityStore for FakeIdentity {
    async fn exists(&self, organization_id: &str) -> Result<bool, DirectoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(DirectoryError::Unavailable(StoreError::Status {
                status: 401,
                body: "Permission denied".to_string(),
            }));
        }
        Ok(self.known.contains(organization_id))
    }
}

/// In-memory registry that counts calls and can be told to fail writes.
#[derive(Default)]
pub struct FakeRegistry {
    pub inner: MemoryBuildRegistry,
    pub fail_writes: bool,
    pub fail_lookups: bool,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
    pub lookups: AtomicUsize,
}

impl FakeRegistry {
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    pub fn failing_lookups() -> Self {
        Self {
            fail_lookups: true,
            ..Default::default()
        }
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.create_count() + self.update_count()
    }

    fn unavailable() -> RegistryError {
        RegistryError::Store(StoreError::Status {
            status: 503,
            body: "Service Unavailable".to_string(),
        })
    }
}

#[async_trait]
impl BuildRegistry for FakeRegistry {
    async fn create(&self, record: &BuildRecord) -> Result<RecordKey, RegistryError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(Self::unavailable());
        }
        self.inner.create(record).await
    }

    async fn find_most_recent_by_label(
        &self,
        organization_id: &str,
        label: &str,
    ) -> Result<Option<RecordKey>, RegistryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups {
            return Err(Self::unavailable());
        }
        self.inner
            .find_most_recent_by_label(organization_id, label)
            .await
    }

    async fn update(&self, key: &RecordKey, record: &BuildRecord) -> Result<(), RegistryError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(Self::unavailable());
        }
        self.inner.update(key, record).await
    }
}

/// Transfer that reports progress in quarters. Optionally refuses authorization,
/// fails the PUT, or parks mid-transfer until released.
#[derive(Default)]
pub struct FakeTransfer {
    pub deny_authorization: bool,
    pub put_status: Option<u16>,
    pub gate: Option<(Arc<Notify>, Arc<Notify>)>,
    pub authorizations: AtomicUsize,
    pub transfers: AtomicUsize,
    pub last_object: std::sync::Mutex<Option<String>>,
}

impl FakeTransfer {
    pub fn denying() -> Self {
        Self {
            deny_authorization: true,
            ..Default::default()
        }
    }

    pub fn failing_with(status: u16) -> Self {
        Self {
            put_status: Some(status),
            ..Default::default()
        }
    }

    /// Signals `started` once bytes begin flowing, then waits for `release`.
    pub fn gated(started: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self {
            gate: Some((started, release)),
            ..Default::default()
        }
    }

    pub fn authorization_count(&self) -> usize {
        self.authorizations.load(Ordering::SeqCst)
    }

    pub fn transfer_count(&self) -> usize {
        self.transfers.load(Ordering::SeqCst)
    }

    pub fn last_object(&self) -> Option<String> {
        self.last_object.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactTransfer for FakeTransfer {
    async fn request_authorization(
        &self,
        object_name: &str,
        content_type: &str,
    ) -> TransferResult<AuthorizationGrant> {
        self.authorizations.fetch_add(1, Ordering::SeqCst);
        *self.last_object.lock().unwrap() = Some(object_name.to_string());
        if self.deny_authorization {
            return Err(TransferError::AuthorizationDenied("HTTP 403 Forbidden".to_string()));
        }
        Ok(AuthorizationGrant {
            object_key: object_name.to_string(),
            url: format!("https://storage.example.com/{}?X-Amz-Signature=abc", object_name),
            content_type: content_type.to_string(),
        })
    }

    async fn transfer(
        &self,
        file: &ArtifactFile,
        grant: &AuthorizationGrant,
        on_progress: ProgressFn<'_>,
    ) -> TransferResult<String> {
        self.transfers.fetch_add(1, Ordering::SeqCst);
        let total = file.size;
        on_progress(0, total);
        on_progress(total / 4, total);

        if let Some((started, release)) = &self.gate {
            started.notify_one();
            release.notified().await;
        }

        if let Some(status) = self.put_status {
            return Err(TransferError::TransferFailed(format!("HTTP {}", status)));
        }

        on_progress(total / 2, total);
        on_progress(total, total);
        Ok(format!("{}/{}", CDN, grant.object_key))
    }

    fn backend_type(&self) -> TransferBackend {
        TransferBackend::Presigned
    }
}
