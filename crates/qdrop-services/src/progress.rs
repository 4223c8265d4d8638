//! Progress reporting for a submit session.
//!
//! Percentages follow a fixed partition: identity and authorization 0–10,
//! byte transfer 10–80 proportional to bytes sent, persistence 80–100.

use std::sync::Mutex;

use qdrop_core::models::{UploadPhase, UploadProgress};
use tokio::sync::mpsc;

pub const VALIDATING: u8 = 0;
pub const CHECKING_IDENTITY: u8 = 2;
pub const RESOLVING_TARGET: u8 = 4;
pub const REQUESTING_AUTHORIZATION: u8 = 5;
pub const TRANSFER_START: u8 = 10;
pub const TRANSFER_END: u8 = 80;
pub const COMPLETE: u8 = 100;

const MIB: f64 = 1024.0 * 1024.0;

/// Receives progress updates. Called synchronously from the session's task, so
/// implementations should return quickly.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: &UploadProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(&UploadProgress) + Send + Sync,
{
    fn report(&self, progress: &UploadProgress) {
        self(progress)
    }
}

impl ProgressSink for mpsc::UnboundedSender<UploadProgress> {
    fn report(&self, progress: &UploadProgress) {
        // A dropped receiver only means nobody is watching.
        let _ = self.send(progress.clone());
    }
}

/// Discards every update.
impl ProgressSink for () {
    fn report(&self, _progress: &UploadProgress) {}
}

/// Percentage for `sent` of `total` bytes within the transfer span.
pub fn transfer_percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return TRANSFER_END;
    }
    let span = u64::from(TRANSFER_END - TRANSFER_START);
    let done = sent.min(total).saturating_mul(span) / total;
    TRANSFER_START + done as u8
}

pub fn transfer_message(sent: u64, total: u64) -> String {
    format!(
        "Uploading... {:.1}MB / {:.1}MB",
        sent as f64 / MIB,
        total as f64 / MIB
    )
}

/// Forwards updates to a sink while keeping the percentage non-decreasing and
/// mirroring the latest update into the orchestrator's status slot.
pub(crate) struct ProgressTracker<'a> {
    sink: &'a dyn ProgressSink,
    status: &'a Mutex<UploadProgress>,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(sink: &'a dyn ProgressSink, status: &'a Mutex<UploadProgress>) -> Self {
        Self { sink, status }
    }

    pub(crate) fn emit(&self, phase: UploadPhase, percent: u8, message: impl Into<String>) {
        let update = {
            let mut current = self.status.lock().unwrap_or_else(|e| e.into_inner());
            let percent = percent.min(COMPLETE).max(current.percent);
            *current = UploadProgress {
                phase,
                percent,
                message: message.into(),
            };
            current.clone()
        };
        self.sink.report(&update);
    }

    pub(crate) fn transfer_tick(&self, sent: u64, total: u64) {
        self.emit(
            UploadPhase::Transferring,
            transfer_percent(sent, total),
            transfer_message(sent, total),
        );
    }

    /// Terminal failure keeps the percentage reached so far.
    pub(crate) fn fail(&self, message: impl Into<String>) {
        let percent = self.status.lock().unwrap_or_else(|e| e.into_inner()).percent;
        self.emit(UploadPhase::Failed, percent, message);
    }
}
