//! QDrop authorization broker
//!
//! A small HTTP service that holds the storage credentials and hands out time-limited
//! presigned PUT URLs, so upload clients never see the bucket keys.

pub mod error;
pub mod handlers;
pub mod setup;
pub mod signer;
pub mod state;
pub mod telemetry;

pub use setup::routes::setup_routes;
pub use signer::UrlSigner;
pub use state::AppState;
