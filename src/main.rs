mod api;
mod config;
mod save;
mod storage;

use anyhow::Context;
use api::views::Views;
use axum::Router;
use save::converter::{GvasConverter, SaveConverter};
use std::net::SocketAddr;
use std::sync::Arc;
use storage::session_store::SessionStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub converter: Arc<dyn SaveConverter>,
    pub views: Arc<Views>,
    pub max_upload_bytes: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::init_tracing();
    let cfg = config::AppConfig::from_env()?;
    let store = SessionStore::open(&cfg.session_dir)
        .await
        .with_context(|| format!("failed to open session store at {}", cfg.session_dir.display()))?;
    let state = AppState {
        store: Arc::new(store),
        converter: Arc::new(
            GvasConverter::new().with_max_decoded_bytes(cfg.max_decoded_bytes),
        ),
        views: Arc::new(Views::new()?),
        max_upload_bytes: cfg.max_upload_bytes,
    };

    let mut app: Router = api::routes::router(state);
    if cfg.static_dir.is_dir() {
        info!(dir = %cfg.static_dir.display(), "serving static assets");
        app = api::routes::with_static_assets(app, &cfg.static_dir);
    }
    let app = app
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from((cfg.host, cfg.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind server on {}", addr))?;

    info!("server listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
