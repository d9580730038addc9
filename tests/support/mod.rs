//! Shared harness: a live murmur router on an ephemeral port, a fake
//! identity provider, and blocking HTTP helpers.

#![allow(dead_code)]

use std::sync::Arc;

use murmur::auth::{AuthError, ExternalIdentity, IdentityProvider, JwtService};
use murmur::storage::{NewUser, Storage};
use murmur::web::router::build_router;
use murmur::web::state::{AppState, SharedState};
use serde_json::Value;
use tokio::sync::oneshot;

pub const SECRET: &str = "integration-secret";
pub const CLIENT_ORIGIN: &str = "http://client.test";

/// Accepts a fixed set of codes; everything else fails the exchange.
pub struct FakeProvider;

impl IdentityProvider for FakeProvider {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://provider.test/authorize?client_id=fake&state={state}")
    }

    fn exchange_code(&self, code: &str) -> Result<ExternalIdentity, AuthError> {
        match code {
            "octocat" => Ok(ExternalIdentity {
                provider_id: "583231".to_string(),
                username: "octocat".to_string(),
                display_name: Some("The Octocat".to_string()),
                bio: None,
                avatar_url: Some("https://avatars.test/583231".to_string()),
            }),
            "hubot" => Ok(ExternalIdentity {
                provider_id: "7".to_string(),
                username: "hubot".to_string(),
                display_name: None,
                bio: Some("beep".to_string()),
                avatar_url: None,
            }),
            "me" => Ok(ExternalIdentity {
                provider_id: "42".to_string(),
                username: "me".to_string(),
                display_name: Some("Literally Me".to_string()),
                bio: None,
                avatar_url: None,
            }),
            _ => Err(AuthError::Provider("bad verification code".to_string())),
        }
    }
}

pub struct TestServer {
    pub base: String,
    pub state: SharedState,
    pub jwt: JwtService,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl TestServer {
    pub async fn start() -> Self {
        let storage = Storage::open_in_memory().expect("open storage");
        let jwt = JwtService::new(SECRET);
        let state =
            AppState::new(storage, jwt.clone(), Arc::new(FakeProvider), CLIENT_ORIGIN).shared();
        let app = build_router(Arc::clone(&state), CLIENT_ORIGIN);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let server = axum::serve(listener, app).with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });
        tokio::spawn(async move {
            let _ = server.await;
        });

        Self {
            base: format!("http://{addr}"),
            state,
            jwt,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base, path)
    }

    /// Insert a user directly and return `(id, bearer token)`.
    pub async fn seed_user(&self, username: &str) -> (i64, String) {
        let st = self.state.lock().await;
        let user = st
            .storage
            .insert_user(
                &NewUser {
                    github_id: format!("gh-{username}"),
                    username: username.to_string(),
                    display_name: username.to_string(),
                    bio: None,
                    avatar_url: None,
                },
                1,
            )
            .expect("seed user");
        let token = self.jwt.issue(user.id).expect("issue token");
        (user.id, token)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (u16, Value) {
        call("GET", self.url(path), token.map(str::to_string), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Option<Value>) -> (u16, Value) {
        call("POST", self.url(path), Some(token.to_string()), body).await
    }

    pub async fn patch(&self, path: &str, token: &str, body: Value) -> (u16, Value) {
        call("PATCH", self.url(path), Some(token.to_string()), Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> (u16, Value) {
        call("DELETE", self.url(path), Some(token.to_string()), None).await
    }

    /// Create a post and return its id.
    pub async fn create_post(&self, token: &str, content: &str, reply_to: Option<i64>) -> i64 {
        let mut body = serde_json::json!({ "content": content });
        if let Some(parent) = reply_to {
            body["replyToId"] = Value::from(parent);
        }
        let (status, post) = self.post("/posts", token, Some(body)).await;
        assert_eq!(status, 201, "create post failed: {post}");
        post["id"].as_i64().expect("post id")
    }
}

/// One request with redirects disabled. Returns status and JSON body
/// (`Null` for an empty body).
pub async fn call(
    method: &str,
    url: String,
    token: Option<String>,
    body: Option<Value>,
) -> (u16, Value) {
    let method = method.to_string();
    tokio::task::spawn_blocking(move || {
        let agent = ureq::AgentBuilder::new().redirects(0).build();
        let mut req = agent.request(&method, &url);
        if let Some(token) = token {
            req = req.set("Authorization", &format!("Bearer {token}"));
        }
        let result = match body {
            Some(body) => req.send_json(body),
            None => req.call(),
        };
        let resp = match result {
            Ok(resp) => resp,
            Err(ureq::Error::Status(_, resp)) => resp,
            Err(e) => panic!("{method} {url}: {e}"),
        };
        let status = resp.status();
        let text = resp.into_string().expect("read body");
        let json = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).expect("json body")
        };
        (status, json)
    })
    .await
    .expect("request task")
}

/// GET without following redirects; returns status and `Location`.
pub async fn get_redirect(url: String) -> (u16, Option<String>) {
    tokio::task::spawn_blocking(move || {
        let agent = ureq::AgentBuilder::new().redirects(0).build();
        let resp = match agent.get(&url).call() {
            Ok(resp) => resp,
            Err(ureq::Error::Status(_, resp)) => resp,
            Err(e) => panic!("GET {url}: {e}"),
        };
        (resp.status(), resp.header("location").map(str::to_string))
    })
    .await
    .expect("request task")
}
