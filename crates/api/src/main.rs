use anyhow::{Context, Result};
use pagesplit_api::{build_app, ApiConfig};
use pagesplit_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("pagesplit_api");

    let config = ApiConfig::from_env();
    let bind = config.bind.clone();
    let app = build_app(config.clone());

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    tracing::info!(
        bind = %bind,
        allowed_origins = ?config.allowed_origins,
        max_upload_bytes = config.max_upload_bytes,
        "pagesplit api started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
