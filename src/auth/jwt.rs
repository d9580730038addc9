//! JWT service: issue and verify bearer tokens and OAuth state values.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;

/// Access tokens live for seven days.
pub const TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;
/// A login round-trip through the provider must finish within ten minutes.
pub const STATE_TTL_SECS: i64 = 10 * 60;

const STATE_PURPOSE: &str = "oauth_state";

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: i64,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by the `state` parameter of the login redirect.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateClaims {
    purpose: String,
    nonce: String,
    iat: i64,
    exp: i64,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl_secs: i64,
}

fn now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

impl JwtService {
    /// HMAC-SHA256 service with the default seven-day token lifetime.
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, TOKEN_TTL_SECS)
    }

    pub fn with_ttl(secret: &str, token_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
            token_ttl_secs,
        }
    }

    /// Issue a signed access token for a user.
    pub fn issue(&self, user_id: i64) -> Result<String, AuthError> {
        let now = now_secs();
        let claims = Claims {
            user_id,
            iat: now,
            exp: now + self.token_ttl_secs,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Encode(e.to_string()))
    }

    /// Verify an access token and extract its claims. Fails if the token is
    /// malformed, expired, signed with another secret, or is a state value.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// Issue a fresh `state` value for the provider redirect.
    pub fn issue_state(&self) -> Result<String, AuthError> {
        let mut nonce = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut nonce);
        let now = now_secs();
        let claims = StateClaims {
            purpose: STATE_PURPOSE.to_string(),
            nonce: URL_SAFE_NO_PAD.encode(nonce),
            iat: now,
            exp: now + STATE_TTL_SECS,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Encode(e.to_string()))
    }

    /// Check a `state` value that came back from the provider.
    pub fn verify_state(&self, state: &str) -> Result<(), AuthError> {
        let claims = decode::<StateClaims>(state, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            .claims;
        if claims.purpose != STATE_PURPOSE {
            return Err(AuthError::InvalidToken("not a login state".to_string()));
        }
        Ok(())
    }
}
