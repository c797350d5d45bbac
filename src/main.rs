use build_filter::{router, ServerConfig, SqliteRepository};
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::parse();

    let pool = config.connect().await?;
    let repository = SqliteRepository::new(pool);
    repository.migrate().await?;
    info!(database = %config.database_url, "database ready");

    let listener = TcpListener::bind(&config.listen).await?;
    info!("Listening on {}", config.listen);

    axum::serve(listener, router(Arc::new(repository)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to listen for the shutdown signal");
        std::future::pending::<()>().await;
    }
}
