use std::sync::Arc;

use anyhow::Context;
use secrecy::ExposeSecret;

use depot_api::app::{build_app, in_memory_services};
use depot_infra::seed::seed_directory;
use depot_infra::{PgStore, Services, Settings, Stores};
use depot_observability::LogOptions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    depot_observability::init(&LogOptions::new(
        &settings.telemetry.log_level,
        settings.telemetry.json,
    ));

    let admin_password = settings.auth.admin_password.expose_secret();
    let services = match &settings.database.url {
        Some(url) => {
            let store = PgStore::connect(url.expose_secret(), settings.database.max_connections)
                .await
                .context("failed to connect to postgres")?;
            if settings.database.run_migrations {
                store.migrate().await.context("failed to run migrations")?;
            }
            seed_directory(&store, admin_password).await?;
            Services::new(Stores::shared(Arc::new(store)))
        }
        None => {
            tracing::warn!("no database url configured; using the in-memory store");
            in_memory_services(admin_password).await?
        }
    };

    let app = build_app(
        services,
        settings.auth.jwt_secret.expose_secret().as_bytes(),
        chrono::Duration::minutes(settings.auth.token_ttl_minutes),
    );

    let listener = tokio::net::TcpListener::bind(&settings.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", settings.server.bind))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
