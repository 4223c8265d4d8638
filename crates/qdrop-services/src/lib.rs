//! QDrop Services
//!
//! The submit workflow: validate → verify organization → resolve replacement target →
//! authorize and transfer → persist, with progress reported to the caller throughout.

pub mod orchestrator;
pub mod organization;
pub mod progress;

pub use orchestrator::UploadOrchestrator;
pub use organization::OrganizationService;
pub use progress::ProgressSink;
