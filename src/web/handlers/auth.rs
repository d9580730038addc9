//! Login through the external identity provider.
//!
//! `GET /auth/github` sends the browser to the provider with a signed
//! `state`. The provider calls back with `code` and `state`; on success the
//! browser is redirected to the client with a fresh bearer token, on any
//! failure to the client's login page.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::auth::{AuthError, IdentityProvider, JwtService};
use crate::service::{users, ServiceError};
use crate::web::state::SharedState;
use crate::web::utils::api_error;

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    /// Set by the provider when the user denies access.
    error: Option<String>,
}

#[derive(Debug, Error)]
enum LoginFailure {
    #[error("provider returned error: {0}")]
    Denied(String),
    #[error("callback is missing {0}")]
    MissingParam(&'static str),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("code exchange task failed: {0}")]
    Join(String),
}

pub async fn github_login_handler(State(state): State<SharedState>) -> Response {
    let st = state.lock().await;
    match st.jwt.issue_state() {
        Ok(login_state) => Redirect::temporary(&st.provider.authorize_url(&login_state)).into_response(),
        Err(e) => {
            error!(error = %e, "failed to issue login state");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

pub async fn github_callback_handler(
    State(state): State<SharedState>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    // Short lock: copy out what the exchange needs
    let (jwt, provider, client_origin) = {
        let st = state.lock().await;
        (
            st.jwt.clone(),
            Arc::clone(&st.provider),
            st.client_origin.clone(),
        )
    };

    match complete_login(&state, &jwt, provider, query).await {
        Ok(token) => {
            Redirect::to(&format!("{client_origin}/auth/callback?token={token}")).into_response()
        }
        Err(e) => {
            warn!(error = %e, "login failed");
            Redirect::to(&format!("{client_origin}/login?error=auth_failed")).into_response()
        }
    }
}

async fn complete_login(
    state: &SharedState,
    jwt: &JwtService,
    provider: Arc<dyn IdentityProvider>,
    query: CallbackQuery,
) -> Result<String, LoginFailure> {
    if let Some(err) = query.error {
        return Err(LoginFailure::Denied(err));
    }
    let login_state = query.state.ok_or(LoginFailure::MissingParam("state"))?;
    jwt.verify_state(&login_state)?;
    let code = query.code.ok_or(LoginFailure::MissingParam("code"))?;

    // Blocking HTTP to the provider, no lock held
    let identity = tokio::task::spawn_blocking(move || provider.exchange_code(&code))
        .await
        .map_err(|e| LoginFailure::Join(e.to_string()))??;

    let user = {
        let st = state.lock().await;
        users::find_or_create_from_identity(&st.storage, &identity)?
    };
    info!(user_id = user.id, username = %user.username, "login");
    Ok(jwt.issue(user.id)?)
}
