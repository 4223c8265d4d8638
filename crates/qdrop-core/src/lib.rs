//! QDrop Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration, artifact validation
//! and preference storage shared by every qdrop component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod preferences;
pub mod transfer_types;
pub mod validation;

// Re-export commonly used types
pub use config::QDropConfig;
pub use error::{ErrorKind, ErrorMetadata, LogLevel, UploadError};
pub use preferences::{
    FilePreferenceStore, MemoryPreferenceStore, PreferenceError, PreferenceStore,
};
pub use transfer_types::TransferBackend;
pub use validation::{ArtifactValidator, FormField, ValidationError};
