//! Typed wrapper over every REST endpoint.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::client::{ClientError, Session};
use crate::model::{FieldError, PostView, Profile, ProfileView, UserCard};
use crate::service::posts::NewPost;
use crate::service::profile::ProfilePatch;
use crate::storage::{FollowRow, LikeRow};

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// `GET /api/health` body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Health {
    pub status: String,
    pub users: u32,
    pub posts: u32,
}

pub struct ApiClient {
    base: url::Url,
    agent: ureq::Agent,
    session: Arc<Session>,
}

impl ApiClient {
    /// Client for the server at `base_url` (e.g. `http://localhost:3000`).
    pub fn new(base_url: &str, session: Arc<Session>) -> Result<Self, ClientError> {
        let base = url::Url::parse(base_url)
            .map_err(|e| ClientError::Transport(format!("invalid base url '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::Transport(format!(
                "invalid base url '{base_url}'"
            )));
        }
        let agent = ureq::AgentBuilder::new().timeout(HTTP_TIMEOUT).build();
        Ok(Self {
            base,
            agent,
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Where the browser goes to start a login.
    pub fn login_url(&self) -> String {
        self.url(&["auth", "github"])
    }

    // -----------------------------------------------------------------------
    // Health
    // -----------------------------------------------------------------------

    pub fn health(&self) -> Result<Health, ClientError> {
        self.get(&["health"])
    }

    // -----------------------------------------------------------------------
    // Posts
    // -----------------------------------------------------------------------

    pub fn feed(&self) -> Result<Vec<PostView>, ClientError> {
        self.get(&["posts"])
    }

    pub fn explore(&self) -> Result<Vec<PostView>, ClientError> {
        self.get(&["posts", "explore"])
    }

    pub fn post(&self, post_id: i64) -> Result<PostView, ClientError> {
        self.get(&["posts", &post_id.to_string()])
    }

    pub fn posts_by_user(&self, user_id: i64) -> Result<Vec<PostView>, ClientError> {
        self.get(&["posts", "user", &user_id.to_string()])
    }

    pub fn create_post(
        &self,
        content: &str,
        reply_to_id: Option<i64>,
    ) -> Result<PostView, ClientError> {
        let draft = NewPost::new(content, reply_to_id);
        self.send_json("POST", &["posts"], &draft)
    }

    pub fn delete_post(&self, post_id: i64) -> Result<(), ClientError> {
        self.send_empty("DELETE", &["posts", &post_id.to_string()])
    }

    pub fn like(&self, post_id: i64) -> Result<LikeRow, ClientError> {
        self.call("POST", &["posts", &post_id.to_string(), "like"])
    }

    pub fn unlike(&self, post_id: i64) -> Result<(), ClientError> {
        self.send_empty("DELETE", &["posts", &post_id.to_string(), "like"])
    }

    // -----------------------------------------------------------------------
    // Follows
    // -----------------------------------------------------------------------

    pub fn follow(&self, user_id: i64) -> Result<FollowRow, ClientError> {
        self.call("POST", &["follows", &user_id.to_string()])
    }

    pub fn unfollow(&self, user_id: i64) -> Result<(), ClientError> {
        self.send_empty("DELETE", &["follows", &user_id.to_string()])
    }

    // -----------------------------------------------------------------------
    // Profiles and users
    // -----------------------------------------------------------------------

    pub fn me(&self) -> Result<Profile, ClientError> {
        self.get(&["profile", "me"])
    }

    pub fn update_me(&self, patch: &ProfilePatch) -> Result<Profile, ClientError> {
        self.send_json("PATCH", &["profile", "me"], patch)
    }

    pub fn profile(&self, username: &str) -> Result<ProfileView, ClientError> {
        self.get(&["profile", username])
    }

    pub fn followers(&self, username: &str) -> Result<Vec<UserCard>, ClientError> {
        self.get(&["profile", username, "followers"])
    }

    pub fn following(&self, username: &str) -> Result<Vec<UserCard>, ClientError> {
        self.get(&["profile", username, "following"])
    }

    pub fn users(&self) -> Result<Vec<UserCard>, ClientError> {
        self.get(&["users"])
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    /// `{base}/api/{segments...}` with each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url.into()
    }

    fn request(&self, method: &str, segments: &[&str]) -> ureq::Request {
        let mut req = self
            .agent
            .request(method, &self.url(segments))
            .set("Accept", "application/json");
        if let Some(token) = self.session.token() {
            req = req.set("Authorization", &format!("Bearer {token}"));
        }
        req
    }

    fn dispatch(
        &self,
        method: &str,
        segments: &[&str],
        result: Result<ureq::Response, ureq::Error>,
    ) -> Result<ureq::Response, ClientError> {
        match result {
            Ok(resp) => Ok(resp),
            Err(ureq::Error::Status(status, resp)) => {
                debug!(method, path = ?segments, status, "api request failed");
                Err(self.normalize(status, resp))
            }
            Err(ureq::Error::Transport(t)) => Err(ClientError::Transport(t.to_string())),
        }
    }

    fn normalize(&self, status: u16, resp: ureq::Response) -> ClientError {
        if status == 401 {
            self.session.clear();
            return ClientError::Unauthorized;
        }
        let body: serde_json::Value = resp.into_json().unwrap_or(serde_json::Value::Null);
        if let Some(errors) = body.get("errors") {
            if let Ok(errors) = serde_json::from_value::<Vec<FieldError>>(errors.clone()) {
                return ClientError::Validation(errors);
            }
        }
        let message = body["error"]
            .as_str()
            .unwrap_or("Request failed")
            .to_string();
        ClientError::Api { status, message }
    }

    fn decode<T: DeserializeOwned>(resp: ureq::Response) -> Result<T, ClientError> {
        resp.into_json()
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        self.call("GET", segments)
    }

    fn call<T: DeserializeOwned>(&self, method: &str, segments: &[&str]) -> Result<T, ClientError> {
        let result = self.request(method, segments).call();
        Self::decode(self.dispatch(method, segments, result)?)
    }

    fn send_json<B, T>(&self, method: &str, segments: &[&str], body: &B) -> Result<T, ClientError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload =
            serde_json::to_value(body).map_err(|e| ClientError::Decode(e.to_string()))?;
        let result = self
            .request(method, segments)
            .set("Content-Type", "application/json")
            .send_json(payload);
        Self::decode(self.dispatch(method, segments, result)?)
    }

    /// Request with no body whose success response (204) has none either.
    fn send_empty(&self, method: &str, segments: &[&str]) -> Result<(), ClientError> {
        let result = self.request(method, segments).call();
        self.dispatch(method, segments, result).map(|_| ())
    }
}
