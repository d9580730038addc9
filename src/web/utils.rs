//! Response helpers shared by the handlers.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::model::FieldError;
use crate::service::ServiceError;

/// Build a standard JSON error response.
pub fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, axum::Json(body)).into_response()
}

/// `400 { "errors": [...] }`.
pub fn validation_error(errors: Vec<FieldError>) -> Response {
    let body = serde_json::json!({ "errors": errors });
    (StatusCode::BAD_REQUEST, axum::Json(body)).into_response()
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::Validation(errors) => validation_error(errors),
            ServiceError::NotFound(msg) => api_error(StatusCode::NOT_FOUND, msg),
            ServiceError::Forbidden(msg) => api_error(StatusCode::FORBIDDEN, msg),
            ServiceError::Conflict(msg) => api_error(StatusCode::BAD_REQUEST, msg),
            ServiceError::Rejected(msg) => api_error(StatusCode::BAD_REQUEST, msg),
            ServiceError::Storage(e) => {
                error!(error = %e, "storage failure");
                api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

/// Parse an integer path parameter, reporting failures against `field`
/// with `label` as the human-readable name ("Post ID").
pub fn parse_id(field: &str, label: &str, raw: &str) -> Result<i64, ServiceError> {
    raw.trim().parse::<i64>().map_err(|_| {
        ServiceError::invalid(field, "params", &format!("{label} must be a valid integer"))
    })
}

/// Unwrap a JSON body, turning a rejection into a body validation error.
pub fn json_body<T>(body: Result<axum::Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    match body {
        Ok(axum::Json(value)) => Ok(value),
        Err(rejection) => Err(ServiceError::invalid(
            "body",
            "body",
            &rejection.body_text(),
        )),
    }
}
