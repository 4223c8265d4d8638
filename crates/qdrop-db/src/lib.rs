//! Data access for qdrop
//!
//! Both the organization directory and the build registry live in a realtime document
//! store addressed by path-like keys (`organizations/{id}`, `builds/{org}/{key}`).
//! `DocumentClient` speaks its REST dialect; `IdentityStore` and `BuildRegistry` are the
//! traits the upload workflow depends on, each with a remote and an in-memory implementation.

pub mod client;
pub mod error;
pub mod identity;
pub mod registry;

pub use client::DocumentClient;
pub use error::{DirectoryError, RegistryError, StoreError};
pub use identity::{IdentityStore, MemoryIdentityStore, RemoteIdentityStore};
pub use registry::{select_most_recent, BuildRegistry, MemoryBuildRegistry, RemoteBuildRegistry};
