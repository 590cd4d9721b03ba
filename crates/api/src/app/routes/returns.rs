//! Return documents. Supplier and customer returns share handlers and
//! differ only in their service and the menus that guard them.

use std::fmt::{Debug, Display};
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;

use depot_auth::{Permission, menus};
use depot_core::{CustomerId, CustomerReturnListId, DomainError, ReturnListId, SupplierId};
use depot_infra::Services;
use depot_infra::services::ReturnService;

use crate::app::errors::ApiError;
use crate::app::{AppState, dto};
use crate::authz::{require_all, require_any};
use crate::context::PrincipalContext;

trait ReturnKind: Send + Sync + 'static {
    type Id: Copy + Default + Display + Debug + Serialize + FromStr<Err = DomainError> + Send + Sync + 'static;
    type Party: Copy + PartialEq + Debug + Serialize + FromStr<Err = DomainError> + Send + Sync + 'static;

    const ENTRY: Permission;
    const QUERY: Permission;
    const STATISTICS: Permission;

    fn service(services: &Services) -> &ReturnService<Self::Id, Self::Party>;
}

struct SupplierReturns;

impl ReturnKind for SupplierReturns {
    type Id = ReturnListId;
    type Party = SupplierId;

    const ENTRY: Permission = menus::RETURN_ENTRY;
    const QUERY: Permission = menus::RETURN_QUERY;
    const STATISTICS: Permission = menus::SUPPLIER_STATISTICS;

    fn service(services: &Services) -> &ReturnService<ReturnListId, SupplierId> {
        &services.returns
    }
}

struct CustomerReturns;

impl ReturnKind for CustomerReturns {
    type Id = CustomerReturnListId;
    type Party = CustomerId;

    const ENTRY: Permission = menus::CUSTOMER_RETURN_ENTRY;
    const QUERY: Permission = menus::CUSTOMER_RETURN_QUERY;
    const STATISTICS: Permission = menus::CUSTOMER_STATISTICS;

    fn service(services: &Services) -> &ReturnService<CustomerReturnListId, CustomerId> {
        &services.customer_returns
    }
}

pub fn supplier_router() -> Router {
    router::<SupplierReturns>()
}

pub fn customer_router() -> Router {
    router::<CustomerReturns>()
}

fn router<K: ReturnKind>() -> Router {
    Router::new()
        .route("/save", post(save::<K>))
        .route("/list", get(list::<K>))
        .route("/delete", post(delete::<K>))
        .route("/state", post(update_state::<K>))
        .route("/number", get(number::<K>))
}

async fn save<K: ReturnKind>(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::SaveHeaderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[K::ENTRY]).await?;
    let draft = body.into_draft::<K::Party>()?;
    let header = K::service(&state.services)
        .save_document(principal.principal(), draft)
        .await?;
    Ok((StatusCode::CREATED, Json(header)))
}

async fn list<K: ReturnKind>(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::DocumentListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_any(&state.services.authorization, &principal, &[K::QUERY, K::STATISTICS]).await?;
    let filter = query.into_filter::<K::Party>()?;
    let headers = K::service(&state.services)
        .list_documents(principal.principal(), filter)
        .await?;
    Ok(Json(headers))
}

async fn delete<K: ReturnKind>(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::IdRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[K::QUERY]).await?;
    let id: K::Id = dto::parse_id("id", &body.id)?;
    K::service(&state.services)
        .delete_document(principal.principal(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_state<K: ReturnKind>(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::StateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[K::STATISTICS]).await?;
    let id: K::Id = dto::parse_id("id", &body.id)?;
    let header = K::service(&state.services)
        .update_state(principal.principal(), body.state()?, id)
        .await?;
    Ok(Json(header))
}

async fn number<K: ReturnKind>(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::NumberQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[K::ENTRY]).await?;
    let number = K::service(&state.services).next_number(query.date()?).await?;
    Ok(Json(serde_json::json!({ "number": number })))
}
