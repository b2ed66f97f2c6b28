//! Tabletop Server - Main Entry Point

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tabletop_server::{api, config::Config, db};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabletop_server=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Config::from_env()?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting tabletop server");

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    db::run_migrations(&pool).await?;

    let bind_address = config.bind_address.clone();
    let app = api::create_router(api::AppState::new(pool, config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down cleanly");
    Ok(())
}

/// Resolve on Ctrl+C. Without a signal handler the server runs until killed.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "Could not listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
