use crate::AppState;
use crate::api::handlers;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::path::Path;
use tower_http::services::ServeDir;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let body_limit = state
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(handlers::pages::index))
        .route("/upload", post(handlers::upload::upload))
        .route(
            "/edit/{session_id}",
            get(handlers::pages::edit_page).post(handlers::edit::save_edit),
        )
        .route("/download/{session_id}", get(handlers::download::download))
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub fn with_static_assets(router: Router, static_dir: &Path) -> Router {
    router.nest_service("/static", ServeDir::new(static_dir))
}
