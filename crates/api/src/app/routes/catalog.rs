//! Suppliers, customers, goods types and goods.
//!
//! Listings are open to the entry screens that pick from them; changes need
//! the matching admin menu.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};

use depot_auth::menus;
use depot_core::{CustomerId, GoodsId, GoodsTypeId, SupplierId};
use depot_infra::services::GoodsQuery;
use depot_parties::PartyDetails;
use depot_products::NewGoods;

use crate::app::errors::ApiError;
use crate::app::{AppState, dto};
use crate::authz::{require_all, require_any};
use crate::context::PrincipalContext;

pub fn suppliers_router() -> Router {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route("/:id", delete(delete_supplier))
}

pub fn customers_router() -> Router {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/:id", delete(delete_customer))
}

pub fn goods_types_router() -> Router {
    Router::new()
        .route("/", get(list_goods_types).post(create_goods_type))
        .route("/:id", delete(delete_goods_type))
}

pub fn goods_router() -> Router {
    Router::new()
        .route("/", get(list_goods).post(create_goods))
        .route("/:id", delete(delete_goods))
}

// -------------------------
// Suppliers
// -------------------------

async fn list_suppliers(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<impl IntoResponse, ApiError> {
    require_any(
        &state.services.authorization,
        &principal,
        &[menus::SUPPLIER_ADMIN, menus::PURCHASE_ENTRY, menus::RETURN_ENTRY],
    )
    .await?;
    Ok(Json(state.services.catalog.list_suppliers(principal.principal()).await?))
}

async fn create_supplier(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::PartyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::SUPPLIER_ADMIN]).await?;
    let details = PartyDetails::new(&body.name, body.contact, body.remarks)?;
    let supplier = state
        .services
        .catalog
        .create_supplier(principal.principal(), details)
        .await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

async fn delete_supplier(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::SUPPLIER_ADMIN]).await?;
    let id: SupplierId = dto::parse_id("supplier id", &id)?;
    state.services.catalog.delete_supplier(principal.principal(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -------------------------
// Customers
// -------------------------

async fn list_customers(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<impl IntoResponse, ApiError> {
    require_any(
        &state.services.authorization,
        &principal,
        &[menus::CUSTOMER_ADMIN, menus::CUSTOMER_RETURN_ENTRY],
    )
    .await?;
    Ok(Json(state.services.catalog.list_customers(principal.principal()).await?))
}

async fn create_customer(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::PartyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::CUSTOMER_ADMIN]).await?;
    let details = PartyDetails::new(&body.name, body.contact, body.remarks)?;
    let customer = state
        .services
        .catalog
        .create_customer(principal.principal(), details)
        .await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn delete_customer(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::CUSTOMER_ADMIN]).await?;
    let id: CustomerId = dto::parse_id("customer id", &id)?;
    state.services.catalog.delete_customer(principal.principal(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -------------------------
// Goods types
// -------------------------

async fn list_goods_types(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<impl IntoResponse, ApiError> {
    require_any(
        &state.services.authorization,
        &principal,
        &[menus::GOODS_ADMIN, menus::PURCHASE_ENTRY],
    )
    .await?;
    Ok(Json(state.services.catalog.list_goods_types(principal.principal()).await?))
}

async fn create_goods_type(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::GoodsTypeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::GOODS_ADMIN]).await?;
    let goods_type = state
        .services
        .catalog
        .create_goods_type(principal.principal(), &body.name, body.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(goods_type)))
}

async fn delete_goods_type(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::GOODS_ADMIN]).await?;
    let id: GoodsTypeId = dto::parse_id("goods type id", &id)?;
    state.services.catalog.delete_goods_type(principal.principal(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -------------------------
// Goods
// -------------------------

async fn list_goods(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<GoodsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_any(
        &state.services.authorization,
        &principal,
        &[menus::GOODS_ADMIN, menus::PURCHASE_ENTRY],
    )
    .await?;
    Ok(Json(state.services.catalog.list_goods(principal.principal(), &query).await?))
}

async fn create_goods(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewGoods>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::GOODS_ADMIN]).await?;
    let goods = state.services.catalog.create_goods(principal.principal(), body).await?;
    Ok((StatusCode::CREATED, Json(goods)))
}

async fn delete_goods(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::GOODS_ADMIN]).await?;
    let id: GoodsId = dto::parse_id("goods id", &id)?;
    state.services.catalog.delete_goods(principal.principal(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
