//! Authentication: bearer tokens and the external identity provider.
//!
//! Tokens are stateless HS256 JWTs carrying the user id. The login flow
//! goes through an [`IdentityProvider`] (GitHub in production) and only
//! needs the server-side JWT secret, never a session table.

pub mod jwt;
pub mod provider;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use jwt::{Claims, JwtService};
pub use provider::{ExternalIdentity, GithubProvider, IdentityProvider};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing authorization token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token encoding failed: {0}")]
    Encode(String),

    /// The identity provider rejected the exchange or was unreachable.
    #[error("identity provider: {0}")]
    Provider(String),
}

/// Minimal identity resolved from a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub display_name: String,
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
