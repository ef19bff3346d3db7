use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use boxoffice_api::{app, AppState};
use boxoffice_core::{Coordinator, CoordinatorConfig};
use boxoffice_locks::RedlockClient;
use boxoffice_store::{CatalogRepository, DbClient, PgBookingStore, RedisCache};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boxoffice_api=debug,boxoffice_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = boxoffice_store::app_config::Config::load().context("Failed to load config")?;
    tracing::info!("Starting Boxoffice API on port {}", config.server.port);

    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    let cache = RedisCache::new(&config.cache.url).context("Failed to connect to cache")?;
    let locks = RedlockClient::new(
        &config.lock.node_urls,
        Duration::from_millis(config.lock.node_timeout_millis),
    )
    .context("Failed to set up lock nodes")?;

    let coordinator = Coordinator::new(
        Arc::new(PgBookingStore::new(db.pool.clone())),
        Arc::new(locks),
        Arc::new(cache),
        CoordinatorConfig {
            lock_ttl: Duration::from_secs(config.business_rules.seat_hold_seconds),
            denial_ttl: Duration::from_secs(config.business_rules.denial_marker_seconds),
        },
    );

    let app_state = AppState {
        coordinator: Arc::new(coordinator),
        catalog: Arc::new(CatalogRepository::new(db.pool.clone())),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind listener")?;
    axum::serve(listener, app).await.context("Server exited")?;
    Ok(())
}
