use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use thiserror::Error;
use tracing::{debug, error};

use common::types::Flash;
use service::ServiceError;

/// Where a denied request is sent.
pub const UNAUTHORIZED_TARGET: &str = "/dashboard";

/// Failure of a page handler, mapped onto the page conventions:
/// validation errors come back as a 422 field list, authorization failures
/// redirect to the dashboard, storage failures are logged and hidden.
#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl PageError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        PageError::BadRequest(msg.into())
    }
}

impl From<models::errors::FieldErrors> for PageError {
    fn from(fields: models::errors::FieldErrors) -> Self {
        PageError::Service(ServiceError::Validation(fields))
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::Service(ServiceError::Validation(fields)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(serde_json::json!({ "errors": fields }))).into_response()
            }
            PageError::Service(ServiceError::Forbidden(reason)) => {
                debug!(event = "access_denied", %reason);
                let target = Flash::Error("unauthorized".into()).redirect_target(UNAUTHORIZED_TARGET);
                Redirect::to(&target).into_response()
            }
            PageError::Service(ServiceError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": msg }))).into_response()
            }
            PageError::Service(e @ (ServiceError::Db(_) | ServiceError::Internal(_))) => {
                error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": "internal server error" }))).into_response()
            }
            PageError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": msg }))).into_response()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(String),
    #[error("bootstrap failed: {0}")]
    Bootstrap(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
