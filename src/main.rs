mod api;
mod config;
mod db;
mod error;
mod export;
mod ledger;
mod normalize;
mod report;
mod state;
mod static_files;

use std::net::SocketAddr;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(&config.log_level);

    config.log_startup_warnings();
    config
        .ensure_data_dir()
        .context("failed to create data directory")?;

    let pool = db::connect_and_migrate(&config)
        .await
        .context("failed to initialize database")?;

    let state = AppState::new(config.clone(), pool);
    let max_request_body_bytes = state.config.max_request_body_bytes;

    let mut app = Router::new()
        .nest("/api/v1", api::router())
        .route("/healthz", get(api::healthz))
        .fallback(get(static_files::serve_embedded_asset))
        .layer(DefaultBodyLimit::max(max_request_body_bytes))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Some(cors) = cors_layer(config.cors_origin.as_deref())? {
        app = app.layer(cors);
    }

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, data_dir = %config.data_dir.display(), "ppms server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("axum server error")?;

    Ok(())
}

fn init_tracing(default_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn cors_layer(origin: Option<&str>) -> anyhow::Result<Option<CorsLayer>> {
    let Some(origin) = origin.map(str::trim).filter(|origin| !origin.is_empty()) else {
        return Ok(None);
    };

    let allow_origin = if origin == "*" {
        AllowOrigin::any()
    } else {
        let value = HeaderValue::from_str(origin)
            .with_context(|| format!("invalid PPMS_CORS_ORIGIN: {origin}"))?;
        AllowOrigin::exact(value)
    };

    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(Any)
            .allow_headers(Any),
    ))
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    info!("shutting down");
}
