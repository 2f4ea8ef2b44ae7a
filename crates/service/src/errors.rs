use models::errors::{FieldErrors, ModelError};
use sea_orm::DbErr;

use crate::auth::errors::AuthError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(FieldErrors),
    #[error("not found: {0}")]
    NotFound(String),
    /// The row exists but lies outside the session's scope, or the role lacks the permission.
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn forbidden(reason: impl Into<String>) -> Self { Self::Forbidden(reason.into()) }

    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(fields) => ServiceError::Validation(fields),
            ModelError::Db(msg) => ServiceError::Db(msg),
        }
    }
}

impl From<DbErr> for ServiceError {
    fn from(e: DbErr) -> Self { ServiceError::Db(e.to_string()) }
}

impl From<FieldErrors> for ServiceError {
    fn from(fields: FieldErrors) -> Self { ServiceError::Validation(fields) }
}

impl From<AuthError> for ServiceError {
    fn from(e: AuthError) -> Self { ServiceError::Internal(e.to_string()) }
}
