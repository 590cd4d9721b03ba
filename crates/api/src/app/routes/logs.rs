use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    response::IntoResponse,
};

use depot_auth::menus;

use crate::app::errors::ApiError;
use crate::app::{AppState, dto};
use crate::authz::require_all;
use crate::context::PrincipalContext;

/// Audit log page, newest first.
pub async fn list(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::LogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::SYSTEM_LOG]).await?;
    let (filter, pagination) = query.into_parts()?;
    let page = state
        .services
        .audit
        .list(principal.principal(), filter, pagination)
        .await?;
    Ok(Json(page))
}
