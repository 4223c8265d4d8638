use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;

/// Phase of a single submit attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    Idle,
    Validating,
    CheckingIdentity,
    ResolvingReplacementTarget,
    Transferring,
    Persisting,
    Complete,
    Failed,
}

impl UploadPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadPhase::Complete | UploadPhase::Failed)
    }
}

impl Display for UploadPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            UploadPhase::Idle => "idle",
            UploadPhase::Validating => "validating",
            UploadPhase::CheckingIdentity => "checking_identity",
            UploadPhase::ResolvingReplacementTarget => "resolving_replacement_target",
            UploadPhase::Transferring => "transferring",
            UploadPhase::Persisting => "persisting",
            UploadPhase::Complete => "complete",
            UploadPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Snapshot of a session's state as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadProgress {
    pub phase: UploadPhase,
    /// 0..=100
    pub percent: u8,
    pub message: String,
}

impl UploadProgress {
    pub fn idle() -> Self {
        Self {
            phase: UploadPhase::Idle,
            percent: 0,
            message: String::new(),
        }
    }
}
