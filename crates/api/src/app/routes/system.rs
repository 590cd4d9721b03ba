use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use depot_infra::ServiceError;

use crate::app::AppState;
use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Identity from the token plus freshly resolved roles and permissions.
pub async fn whoami(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = principal.principal();
    let info = state
        .services
        .authorization
        .resolve_authorization(&principal.username)
        .await
        .map_err(|err| match err {
            ServiceError::NotFound(_) => ApiError::unauthorized("unknown principal"),
            other => other.into(),
        })?;
    Ok(Json(serde_json::json!({
        "user_id": principal.user_id.to_string(),
        "username": principal.username,
        "roles": info.roles,
        "permissions": info.permissions,
    })))
}
