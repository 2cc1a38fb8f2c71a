//! # zenith-api — Binary Entry Point
//!
//! Starts the Axum HTTP server. Configuration comes from the environment;
//! see [`zenith_api::AppConfig::from_env`].

use chrono::Duration;
use zenith_api::{AppConfig, AppState};
use zenith_realtime::DEFAULT_PRESENCE_TIMEOUT_SECS;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!(?config, "configuration loaded");

    // A broken cache directory degrades to running without one.
    let state = match AppState::try_with_build_cache(config.clone()) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(
                dir = %config.build_cache_dir.display(),
                error = %e,
                "build cache unavailable, continuing without it"
            );
            AppState::new(config.clone())
        }
    };

    let _sweeper = state.realtime.spawn_sweeper(
        std::time::Duration::from_secs(15),
        Duration::seconds(DEFAULT_PRESENCE_TIMEOUT_SECS),
    );

    let app = zenith_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Zenith API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
