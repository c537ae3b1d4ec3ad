//! SkyRoute server - flight routing with live convective weather hazards.

use anyhow::Result;
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skyroute_server::api;
use skyroute_server::config::Config;
use skyroute_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("skyroute_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting SkyRoute server...");

    let config = Config::from_env();
    let port = config.server_port;
    if config.avwx_token.is_none() {
        tracing::warn!("AVWX_API_TOKEN not set; station lookups run in offline mode");
    }

    let state = Arc::new(AppState::new(config));
    state.load_model_from_disk();

    // Build the app
    let app = api::routes()
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(CorsLayer::permissive());

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
