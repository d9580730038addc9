//! Shared application state.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::auth::{IdentityProvider, JwtService};
use crate::storage::Storage;

pub struct AppState {
    pub storage: Storage,
    pub jwt: JwtService,
    /// Login provider. Kept behind an `Arc` so handlers can clone it out of
    /// the lock before running the blocking code exchange.
    pub provider: Arc<dyn IdentityProvider>,
    /// Browser client origin, without a trailing slash.
    pub client_origin: String,
}

pub type SharedState = Arc<Mutex<AppState>>;

impl AppState {
    pub fn new(
        storage: Storage,
        jwt: JwtService,
        provider: Arc<dyn IdentityProvider>,
        client_origin: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            jwt,
            provider,
            client_origin: client_origin.into(),
        }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }
}
