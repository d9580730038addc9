//! External identity providers for the login flow.
//!
//! The web layer only sees the [`IdentityProvider`] trait: build an
//! authorize URL, then turn the callback `code` into an
//! [`ExternalIdentity`]. [`GithubProvider`] performs the real OAuth
//! exchange over blocking HTTP, so callers run it on a blocking thread.

use std::time::Duration;

use crate::auth::AuthError;

const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_USER_URL: &str = "https://api.github.com/user";
const GITHUB_SCOPE: &str = "user:email";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity reported by the provider after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    /// Stable provider-side account id.
    pub provider_id: String,
    /// Provider handle, used as the preferred local username.
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

pub trait IdentityProvider: Send + Sync {
    /// URL the browser is redirected to in order to start a login.
    fn authorize_url(&self, state: &str) -> String;

    /// Exchange the callback `code` for the user's identity. Blocking.
    fn exchange_code(&self, code: &str) -> Result<ExternalIdentity, AuthError>;
}

pub struct GithubProvider {
    client_id: String,
    client_secret: String,
    callback_url: String,
    agent: ureq::Agent,
}

impl GithubProvider {
    pub fn new(client_id: String, client_secret: String, callback_url: String) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(HTTP_TIMEOUT).build();
        Self {
            client_id,
            client_secret,
            callback_url,
            agent,
        }
    }

    fn fetch_access_token(&self, code: &str) -> Result<String, AuthError> {
        let body: serde_json::Value = self
            .agent
            .post(GITHUB_TOKEN_URL)
            .set("Accept", "application/json")
            .send_form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.callback_url.as_str()),
            ])
            .map_err(|e| AuthError::Provider(format!("token exchange failed: {e}")))?
            .into_json()
            .map_err(|e| AuthError::Provider(format!("token response parse failed: {e}")))?;

        // GitHub reports a bad or reused code with 200 and an `error` field.
        if let Some(err) = body["error"].as_str() {
            return Err(AuthError::Provider(format!("token exchange rejected: {err}")));
        }
        body["access_token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AuthError::Provider("missing access_token in response".to_string()))
    }
}

impl IdentityProvider for GithubProvider {
    fn authorize_url(&self, state: &str) -> String {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.callback_url.as_str()),
            ("scope", GITHUB_SCOPE),
            ("state", state),
        ];
        match url::Url::parse_with_params(GITHUB_AUTHORIZE_URL, &params) {
            Ok(url) => url.into(),
            // The base URL is a constant, so this only trips on a typo above.
            Err(_) => GITHUB_AUTHORIZE_URL.to_string(),
        }
    }

    fn exchange_code(&self, code: &str) -> Result<ExternalIdentity, AuthError> {
        let access_token = self.fetch_access_token(code)?;

        let user: serde_json::Value = self
            .agent
            .get(GITHUB_USER_URL)
            .set("Authorization", &format!("Bearer {access_token}"))
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", "murmur")
            .call()
            .map_err(|e| AuthError::Provider(format!("user fetch failed: {e}")))?
            .into_json()
            .map_err(|e| AuthError::Provider(format!("user response parse failed: {e}")))?;

        identity_from_github_user(&user)
    }
}

/// Map the `GET /user` payload onto an [`ExternalIdentity`].
fn identity_from_github_user(user: &serde_json::Value) -> Result<ExternalIdentity, AuthError> {
    let provider_id = user["id"]
        .as_i64()
        .map(|id| id.to_string())
        .ok_or_else(|| AuthError::Provider("user payload missing id".to_string()))?;
    let username = user["login"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AuthError::Provider("user payload missing login".to_string()))?;
    let text = |key: &str| {
        user[key]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    Ok(ExternalIdentity {
        provider_id,
        username,
        display_name: text("name"),
        bio: text("bio"),
        avatar_url: text("avatar_url"),
    })
}
