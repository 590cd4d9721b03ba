//! Consistent JSON error responses: `{ "error": code, "message": msg }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use depot_core::DomainError;
use depot_infra::services::{AuthError, ServiceError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        json_error(self.status, self.code, self.message)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(what) => ApiError::new(StatusCode::NOT_FOUND, "not_found", format!("{what} not found")),
            ServiceError::Validation(msg) => ApiError::validation(msg),
            ServiceError::Forbidden(missing) => {
                ApiError::new(StatusCode::FORBIDDEN, "forbidden", format!("missing permission {missing}"))
            }
            ServiceError::Store(e) => {
                error!(error = %e, "store failure");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "storage backend failure")
            }
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ServiceError::from(err).into()
    }
}

/// Unknown user and wrong password share one response so usernames cannot
/// be enumerated.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NoSuchIdentity | AuthError::InvalidCredentials => {
                ApiError::unauthorized("invalid username or password")
            }
            AuthError::Disabled => ApiError::new(StatusCode::FORBIDDEN, "account_disabled", "account is disabled"),
            AuthError::Store(e) => ServiceError::Store(e).into(),
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
