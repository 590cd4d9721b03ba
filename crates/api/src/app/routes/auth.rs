use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use secrecy::ExposeSecret;
use tracing::error;

use depot_auth::JwtClaims;

use crate::app::errors::ApiError;
use crate::app::{AppState, dto};
use crate::context::PrincipalContext;

/// Exchange username and password for a bearer token.
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<dto::LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .services
        .authorization
        .login(&body.username, body.password.expose_secret())
        .await?;

    let claims = JwtClaims::for_principal(&outcome.principal(), Utc::now(), state.token_ttl);
    let token = state.tokens.issue(&claims).map_err(|e| {
        error!(error = %e, "failed to sign token");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "token_error", "could not issue token")
    })?;

    Ok(Json(serde_json::json!({
        "token": token,
        "token_type": "Bearer",
        "expires_at": claims.expires_at,
        "user": outcome.user,
        "roles": outcome.authorization.roles,
        "permissions": outcome.authorization.permissions,
    })))
}

/// Tokens are stateless; logout only records the action.
pub async fn logout(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
) -> StatusCode {
    state.services.authorization.logout(principal.principal()).await;
    StatusCode::NO_CONTENT
}
