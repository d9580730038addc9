//! Domain services: validation and relational lookups for each entity.
//!
//! Every operation takes the [`Storage`](crate::storage::Storage) handle and
//! the id of the authenticated viewer, and either returns a JSON view or a
//! [`ServiceError`] that the web layer maps onto an HTTP status.

pub mod follows;
pub mod posts;
pub mod profile;
pub mod users;

use thiserror::Error;

use crate::model::FieldError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input failed validation. Carries one entry per offending field.
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    /// Duplicate like or follow.
    #[error("{0}")]
    Conflict(String),

    /// Well-formed request refused by a business rule.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ServiceError {
    /// Single-field validation failure.
    pub fn invalid(field: &str, location: &str, message: &str) -> Self {
        ServiceError::Validation(vec![FieldError::new(field, location, message)])
    }
}

/// Current time as milliseconds since UNIX epoch.
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
