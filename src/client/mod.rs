//! Client data layer for the murmur API.
//!
//! [`ApiClient`] is the single place that talks HTTP: it attaches the
//! bearer token from the shared [`Session`] and normalizes every failure
//! into a [`ClientError`]. [`projection`] holds the optimistic counters
//! the UI flips before the server confirms.

pub mod api;
pub mod projection;
pub mod session;

use thiserror::Error;

use crate::model::FieldError;

pub use api::{ApiClient, Health};
pub use projection::{FollowProjection, LikeProjection};
pub use session::Session;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the credential. The session has been cleared.
    #[error("not signed in")]
    Unauthorized,

    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    #[error("http transport: {0}")]
    Transport(String),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ClientError {
    /// HTTP status behind this error, when there was a response at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized => Some(401),
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Validation(_) => Some(400),
            ClientError::Transport(_) | ClientError::Decode(_) => None,
        }
    }
}
