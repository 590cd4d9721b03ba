//! Purchase documents: entry, query, settlement and statistics.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use depot_auth::menus;
use depot_core::{PurchaseListId, SupplierId};

use crate::app::errors::ApiError;
use crate::app::{AppState, dto};
use crate::authz::{require_all, require_any};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/save", post(save))
        .route("/list", get(list))
        .route("/goods", get(goods))
        .route("/delete", post(delete))
        .route("/state", post(update_state))
        .route("/count", get(count))
        .route("/number", get(number))
}

async fn save(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::SavePurchaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::PURCHASE_ENTRY]).await?;
    let draft = body.header.into_draft::<SupplierId>()?;
    let header = state
        .services
        .purchases
        .save_document(principal.principal(), draft, body.lines)
        .await?;
    Ok((StatusCode::CREATED, Json(header)))
}

async fn list(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::DocumentListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_any(
        &state.services.authorization,
        &principal,
        &[menus::PURCHASE_QUERY, menus::SUPPLIER_STATISTICS],
    )
    .await?;
    let filter = query.into_filter::<SupplierId>()?;
    let headers = state.services.purchases.list_documents(principal.principal(), filter).await?;
    Ok(Json(headers))
}

async fn goods(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::LineItemsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_any(
        &state.services.authorization,
        &principal,
        &[menus::PURCHASE_QUERY, menus::SUPPLIER_STATISTICS],
    )
    .await?;
    let id: PurchaseListId = dto::parse_id("purchase_list_id", &query.purchase_list_id)?;
    let filter = query.line_filter()?;
    let lines = state
        .services
        .purchases
        .list_line_items(principal.principal(), id, &filter)
        .await?;
    Ok(Json(lines))
}

async fn delete(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::IdRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::PURCHASE_QUERY]).await?;
    let id: PurchaseListId = dto::parse_id("id", &body.id)?;
    state.services.purchases.delete_document(principal.principal(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_state(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::StateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::SUPPLIER_STATISTICS]).await?;
    let id: PurchaseListId = dto::parse_id("id", &body.id)?;
    let header = state
        .services
        .purchases
        .update_state(principal.principal(), body.state()?, id)
        .await?;
    Ok(Json(header))
}

/// Flattened purchase statistics, one row per matching line.
async fn count(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::PURCHASE_STATISTICS]).await?;
    let start = dto::parse_date("start", query.start.as_deref())?;
    let end = dto::parse_date("end", query.end.as_deref())?;
    let filter = query.line_filter()?;
    let rows = state
        .services
        .purchases
        .aggregate_for_report(principal.principal(), start, end, &filter)
        .await?;
    Ok(Json(rows))
}

async fn number(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::NumberQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_all(&state.services.authorization, &principal, &[menus::PURCHASE_ENTRY]).await?;
    let number = state.services.purchases.next_number(query.date()?).await?;
    Ok(Json(serde_json::json!({ "number": number })))
}
