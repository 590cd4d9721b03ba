//! HTTP application wiring (Axum router + shared state).
//!
//! - `routes/`: handlers, one file per area
//! - `dto.rs`: request DTOs and parsing of dates, ids and states
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::{get, post},
};
use chrono::Duration;
use tower::ServiceBuilder;
use tower::limit::ConcurrencyLimitLayer;

use depot_auth::Hs256Jwt;
use depot_infra::seed::{SeedError, seed_directory};
use depot_infra::{InMemoryStore, Services, Stores};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

const MAX_IN_FLIGHT_REQUESTS: usize = 512;

/// Shared per-process state handed to every handler.
pub struct AppState {
    pub services: Services,
    pub tokens: Arc<Hs256Jwt>,
    pub token_ttl: Duration,
}

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(services: Services, jwt_secret: &[u8], token_ttl: Duration) -> Router {
    let tokens = Arc::new(Hs256Jwt::new(jwt_secret));
    let auth_state = middleware::AuthState { jwt: tokens.clone() };
    let state = Arc::new(AppState {
        services,
        tokens,
        token_ttl,
    });

    // Protected routes: require a valid bearer token.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/auth/login", post(routes::auth::login))
        .merge(protected)
        .layer(Extension(state))
        .layer(ServiceBuilder::new().layer(ConcurrencyLimitLayer::new(MAX_IN_FLIGHT_REQUESTS)))
}

/// Services over a fresh, seeded in-memory store.
pub async fn in_memory_services(admin_password: &str) -> Result<Services, SeedError> {
    let store = Arc::new(InMemoryStore::new());
    seed_directory(store.as_ref(), admin_password).await?;
    Ok(Services::new(Stores::shared(store)))
}
