//! User directory handler.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::auth::AuthUser;
use crate::service::{users, ServiceError};
use crate::web::state::SharedState;

pub async fn list_users_handler(
    State(state): State<SharedState>,
    user: AuthUser,
) -> Result<Response, ServiceError> {
    let st = state.lock().await;
    let cards = users::list_users(&st.storage, user.id)?;
    Ok(Json(cards).into_response())
}
