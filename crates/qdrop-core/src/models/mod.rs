//! Domain models for build submission

pub mod artifact;
pub mod build;
pub mod progress;
pub mod session;
pub mod upload_url;

pub use artifact::{content_type_for, ArtifactFile, ArtifactSource, ByteStream};
pub use build::{BuildForm, BuildRecord, CompletedUpload, RecordKey};
pub use progress::{UploadPhase, UploadProgress};
pub use session::Session;
pub use upload_url::{UploadUrlRequest, UploadUrlResponse};
