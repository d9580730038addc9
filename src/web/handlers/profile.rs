//! Profile handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::auth::AuthUser;
use crate::service::profile::{self, ProfilePatch};
use crate::service::ServiceError;
use crate::web::state::SharedState;
use crate::web::utils::json_body;

pub async fn get_own_profile_handler(
    State(state): State<SharedState>,
    user: AuthUser,
) -> Result<Response, ServiceError> {
    let st = state.lock().await;
    let me = profile::get_own_profile(&st.storage, user.id)?;
    Ok(Json(me).into_response())
}

pub async fn update_own_profile_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    body: Result<Json<ProfilePatch>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let patch = json_body(body)?;
    let st = state.lock().await;
    let me = profile::update_own_profile(&st.storage, user.id, &patch)?;
    Ok(Json(me).into_response())
}

pub async fn get_profile_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(username): Path<String>,
) -> Result<Response, ServiceError> {
    let st = state.lock().await;
    let view = profile::get_profile_by_username(&st.storage, user.id, &username)?;
    Ok(Json(view).into_response())
}

pub async fn followers_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(username): Path<String>,
) -> Result<Response, ServiceError> {
    let st = state.lock().await;
    let cards = profile::list_followers(&st.storage, user.id, &username)?;
    Ok(Json(cards).into_response())
}

pub async fn following_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(username): Path<String>,
) -> Result<Response, ServiceError> {
    let st = state.lock().await;
    let cards = profile::list_following(&st.storage, user.id, &username)?;
    Ok(Json(cards).into_response())
}
