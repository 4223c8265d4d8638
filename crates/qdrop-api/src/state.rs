use std::sync::Arc;
use std::time::Duration;

use crate::signer::UrlSigner;

#[derive(Clone)]
pub struct AppState {
    pub signer: Arc<dyn UrlSigner>,
    pub presign_expiry: Duration,
}

impl AppState {
    pub fn new(signer: Arc<dyn UrlSigner>, presign_expiry: Duration) -> Self {
        Self {
            signer,
            presign_expiry,
        }
    }
}
