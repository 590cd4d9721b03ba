//! User, role and menu administration.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use depot_auth::menus;
use depot_core::{RoleId, UserId};
use depot_infra::services::{NewRole, NewUser};

use crate::app::errors::ApiError;
use crate::app::{AppState, dto};
use crate::authz::require_all;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id/enabled", post(set_user_enabled))
        .route("/users/:id/roles", get(user_roles).put(assign_roles))
        .route("/roles", get(list_roles).post(create_role))
        .route("/roles/:id/menus", get(role_menus).put(grant_menus))
        .route("/menus", get(list_menus))
}

async fn list_users(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::USER_ADMIN]).await?;
    Ok(Json(state.services.admin.list_users(principal.principal()).await?))
}

async fn create_user(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::USER_ADMIN]).await?;
    let user = state.services.admin.create_user(principal.principal(), body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn set_user_enabled(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::EnabledRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::USER_ADMIN]).await?;
    let id: UserId = dto::parse_id("user id", &id)?;
    let user = state
        .services
        .admin
        .set_user_enabled(principal.principal(), id, body.enabled)
        .await?;
    Ok(Json(user))
}

async fn user_roles(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::USER_ADMIN]).await?;
    let id: UserId = dto::parse_id("user id", &id)?;
    Ok(Json(state.services.admin.roles_of_user(principal.principal(), id).await?))
}

/// Replace the user's role set.
async fn assign_roles(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::RoleIdsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::USER_ADMIN]).await?;
    let id: UserId = dto::parse_id("user id", &id)?;
    let roles = state
        .services
        .admin
        .assign_roles(principal.principal(), id, &body.role_ids)
        .await?;
    Ok(Json(roles))
}

async fn list_roles(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::ROLE_ADMIN]).await?;
    Ok(Json(state.services.admin.list_roles(principal.principal()).await?))
}

async fn create_role(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewRole>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::ROLE_ADMIN]).await?;
    let role = state.services.admin.create_role(principal.principal(), body).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

async fn role_menus(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::ROLE_ADMIN]).await?;
    let id: RoleId = dto::parse_id("role id", &id)?;
    Ok(Json(state.services.admin.menus_of_role(principal.principal(), id).await?))
}

/// Replace the role's menu grants.
async fn grant_menus(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::MenuIdsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::ROLE_ADMIN]).await?;
    let id: RoleId = dto::parse_id("role id", &id)?;
    let granted = state
        .services
        .admin
        .grant_menus(principal.principal(), id, &body.menu_ids)
        .await?;
    Ok(Json(granted))
}

async fn list_menus(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::ROLE_ADMIN]).await?;
    Ok(Json(state.services.admin.list_menus(principal.principal()).await?))
}
