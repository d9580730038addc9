//! Post, timeline and like handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::auth::AuthUser;
use crate::service::posts::{self, NewPost};
use crate::service::ServiceError;
use crate::web::state::SharedState;
use crate::web::utils::{json_body, parse_id};

pub async fn create_post_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    body: Result<Json<NewPost>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let draft = json_body(body)?;
    let st = state.lock().await;
    let view = posts::create_post(&st.storage, user.id, &draft)?;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

pub async fn feed_handler(
    State(state): State<SharedState>,
    user: AuthUser,
) -> Result<Response, ServiceError> {
    let st = state.lock().await;
    let feed = posts::list_feed(&st.storage, user.id)?;
    Ok(Json(feed).into_response())
}

pub async fn explore_handler(
    State(state): State<SharedState>,
    user: AuthUser,
) -> Result<Response, ServiceError> {
    let st = state.lock().await;
    let recent = posts::explore(&st.storage, user.id)?;
    Ok(Json(recent).into_response())
}

pub async fn list_by_author_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Response, ServiceError> {
    let author = parse_id("userId", "User ID", &user_id)?;
    let st = state.lock().await;
    let list = posts::list_by_author(&st.storage, user.id, author)?;
    Ok(Json(list).into_response())
}

pub async fn get_post_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(post_id): Path<String>,
) -> Result<Response, ServiceError> {
    let id = parse_id("postId", "Post ID", &post_id)?;
    let st = state.lock().await;
    let view = posts::get_post(&st.storage, user.id, id)?;
    Ok(Json(view).into_response())
}

pub async fn delete_post_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(post_id): Path<String>,
) -> Result<Response, ServiceError> {
    let id = parse_id("postId", "Post ID", &post_id)?;
    let st = state.lock().await;
    posts::delete_post(&st.storage, user.id, id)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn like_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(post_id): Path<String>,
) -> Result<Response, ServiceError> {
    let id = parse_id("postId", "Post ID", &post_id)?;
    let st = state.lock().await;
    let like = posts::like_post(&st.storage, user.id, id)?;
    Ok((StatusCode::CREATED, Json(like)).into_response())
}

pub async fn unlike_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(post_id): Path<String>,
) -> Result<Response, ServiceError> {
    let id = parse_id("postId", "Post ID", &post_id)?;
    let st = state.lock().await;
    posts::unlike_post(&st.storage, user.id, id)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
