//! Test helpers: recording fakes of the collaborators and an orchestrator wired to them.
//!
//! Run from workspace root: `cargo test -p qdrop-services`.

#![allow(dead_code)]

pub mod fakes;

use std::sync::{Arc, Mutex};

use qdrop_core::models::{ArtifactFile, BuildForm, Session, UploadProgress};
use qdrop_core::{ArtifactValidator, FormField, MemoryPreferenceStore};
use qdrop_services::UploadOrchestrator;

use fakes::{FakeIdentity, FakeRegistry, FakeTransfer};

pub const ORG: &str = "acme";
pub const FIVE_MB: usize = 5 * 1024 * 1024;

/// Orchestrator plus handles on every fake it talks to.
pub struct TestRig {
    pub orchestrator: Arc<UploadOrchestrator>,
    pub identity: Arc<FakeIdentity>,
    pub registry: Arc<FakeRegistry>,
    pub transfer: Arc<FakeTransfer>,
    pub preferences: Arc<MemoryPreferenceStore>,
}

impl TestRig {
    pub fn new(identity: FakeIdentity, registry: FakeRegistry, transfer: FakeTransfer) -> Self {
        let identity = Arc::new(identity);
        let registry = Arc::new(registry);
        let transfer = Arc::new(transfer);
        let preferences = Arc::new(MemoryPreferenceStore::new());

        let validator = ArtifactValidator::new(
            vec![".apk".to_string()],
            100 * 1024 * 1024,
            &[FormField::Submitter],
        );
        let orchestrator = UploadOrchestrator::new(
            validator,
            identity.clone(),
            registry.clone(),
            transfer.clone(),
        )
        .with_preferences(preferences.clone());

        Self {
            orchestrator: Arc::new(orchestrator),
            identity,
            registry,
            transfer,
            preferences,
        }
    }

    /// Known organization, empty registry, working transfer.
    pub fn happy() -> Self {
        Self::new(
            FakeIdentity::known([ORG]),
            FakeRegistry::default(),
            FakeTransfer::default(),
        )
    }
}

pub fn form(version: &str, label: &str) -> BuildForm {
    BuildForm {
        version: version.to_string(),
        label: label.to_string(),
        changelog: "Fixes crash on startup".to_string(),
        submitter_name: "dana".to_string(),
    }
}

pub fn apk(name: &str, size: usize) -> ArtifactFile {
    ArtifactFile::from_bytes(name, vec![7u8; size])
}

/// Scenario A input: "app-1.0.apk" (5 MB), version 1.0, label beta.
pub fn beta_session(replace: bool) -> Session {
    Session::new(ORG)
        .with_form(form("1.0", "beta"))
        .with_file(apk("app-1.0.apk", FIVE_MB))
        .replacing_previous(replace)
}

/// Collects every progress update of a session.
#[derive(Default)]
pub struct ProgressLog {
    updates: Mutex<Vec<UploadProgress>>,
}

impl ProgressLog {
    pub fn record(&self, progress: &UploadProgress) {
        self.updates.lock().unwrap().push(progress.clone());
    }

    pub fn updates(&self) -> Vec<UploadProgress> {
        self.updates.lock().unwrap().clone()
    }

    pub fn percents(&self) -> Vec<u8> {
        self.updates().iter().map(|u| u.percent).collect()
    }

    pub fn last(&self) -> Option<UploadProgress> {
        self.updates().last().cloned()
    }
}
