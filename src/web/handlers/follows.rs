//! Follow handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::auth::AuthUser;
use crate::service::{follows, ServiceError};
use crate::web::state::SharedState;
use crate::web::utils::parse_id;

pub async fn follow_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Response, ServiceError> {
    let target = parse_id("userId", "User ID", &user_id)?;
    let st = state.lock().await;
    let edge = follows::follow(&st.storage, user.id, target)?;
    Ok((StatusCode::CREATED, Json(edge)).into_response())
}

pub async fn unfollow_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Response, ServiceError> {
    let target = parse_id("userId", "User ID", &user_id)?;
    let st = state.lock().await;
    follows::unfollow(&st.storage, user.id, target)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
