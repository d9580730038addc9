//! Health check endpoint.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::service::ServiceError;
use crate::web::state::SharedState;

pub async fn health_handler(State(state): State<SharedState>) -> Result<Response, ServiceError> {
    let st = state.lock().await;
    let users = st.storage.count_users()?;
    let posts = st.storage.count_posts()?;

    let body = serde_json::json!({
        "status": "ok",
        "users": users,
        "posts": posts,
    });
    Ok(Json(body).into_response())
}
