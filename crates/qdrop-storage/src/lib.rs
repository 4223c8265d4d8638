//! QDrop Storage Library
//!
//! This crate moves artifact bytes into object storage. It defines the two-phase
//! `ArtifactTransfer` trait (authorize, then transfer) and two backends:
//!
//! - **presigned**: asks the authorization broker for a presigned PUT URL and streams
//!   the file to it, reporting progress per chunk.
//! - **s3**: writes straight to an S3-compatible bucket with locally configured credentials.
//!
//! # Object naming
//!
//! Objects are named `{organization_id}_{version}_{unix_millis}.{ext}`, which is unique per
//! organization, version and instant without a collision check. Naming and public URL
//! derivation live in the `keys` module so both backends agree.

pub mod factory;
pub mod keys;
#[cfg(feature = "transfer-presigned")]
pub mod presigned;
#[cfg(feature = "transfer-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_transfer;
#[cfg(feature = "transfer-presigned")]
pub use presigned::PresignedTransfer;
pub use qdrop_core::TransferBackend;
#[cfg(feature = "transfer-s3")]
pub use s3::S3Transfer;
pub use traits::{ArtifactTransfer, AuthorizationGrant, ProgressFn, TransferError, TransferResult};
