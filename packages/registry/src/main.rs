use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use plugin_registry::config::AppConfig;
use plugin_registry::package::PackageRegistry;
use plugin_registry::state::AppState;
use plugin_registry::{build_artifact_store, build_router, database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = database::init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    info!("Database ready");

    let store = build_artifact_store(&config.storage, &config.upload)
        .await
        .context("Failed to initialize artifact store")?;
    info!(
        backend = ?config.storage.backend,
        bucket = %config.storage.bucket,
        "Artifact store ready"
    );

    let registry = Arc::new(PackageRegistry::new(
        db,
        store,
        config.storage.bucket.clone(),
    ));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState { registry, config };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Plugin registry listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
