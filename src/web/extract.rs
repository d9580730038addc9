//! Bearer-token extractor for protected handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::auth::{bearer_token, AuthError, AuthUser};
use crate::service::ServiceError;
use crate::web::state::SharedState;
use crate::web::utils::api_error;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        debug!(reason = %self, "rejected credentials");
        api_error(StatusCode::UNAUTHORIZED, "Unauthorized")
    }
}

#[axum::async_trait]
impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| AuthError::MissingToken.into_response())?;

        let st = state.lock().await;
        let claims = st.jwt.verify(token).map_err(IntoResponse::into_response)?;
        match st.storage.get_user(claims.user_id) {
            Ok(Some(user)) => Ok(AuthUser {
                id: user.id,
                username: user.username,
                display_name: user.display_name,
            }),
            Ok(None) => Err(AuthError::InvalidToken(format!(
                "user {} no longer exists",
                claims.user_id
            ))
            .into_response()),
            Err(e) => Err(ServiceError::from(e).into_response()),
        }
    }
}
