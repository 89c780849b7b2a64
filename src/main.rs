use std::net::SocketAddr;

use anyhow::Context;
use brand_studio::{config::Config, routes::{app, AppState}};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env().context("generation API is not configured")?;
    tracing::info!(
        branding = %config.branding_url,
        api_base = %config.api_base_url,
        "Using generation API"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let router = app(AppState::new(config));

    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;
    Ok(())
}
