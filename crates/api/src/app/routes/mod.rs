use axum::{
    Router,
    routing::{get, post},
};

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod logs;
pub mod purchases;
pub mod returns;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/auth/logout", post(auth::logout))
        .nest("/purchases", purchases::router())
        .nest("/returns", returns::supplier_router())
        .nest("/customer-returns", returns::customer_router())
        .nest("/suppliers", catalog::suppliers_router())
        .nest("/customers", catalog::customers_router())
        .nest("/goods-types", catalog::goods_types_router())
        .nest("/goods", catalog::goods_router())
        .nest("/admin", admin::router())
        .route("/logs", get(logs::list))
}
