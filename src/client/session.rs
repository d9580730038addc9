//! Bearer credential owned by the application and shared with the
//! API client.

use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct Session {
    token: RwLock<Option<String>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    /// Session from the URL the server redirects to after login, e.g.
    /// `http://localhost:5173/auth/callback?token=...`. `None` when the URL
    /// does not parse or carries no token.
    pub fn from_callback_url(callback_url: &str) -> Option<Self> {
        let url = url::Url::parse(callback_url).ok()?;
        let token = url
            .query_pairs()
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned())
            .filter(|t| !t.is_empty())?;
        Some(Self::with_token(token))
    }

    pub fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_token(&self, token: impl Into<String>) {
        let mut guard = match self.token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(token.into());
    }

    pub fn clear(&self) {
        let mut guard = match self.token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}
