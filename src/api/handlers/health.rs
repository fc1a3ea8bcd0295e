use crate::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tracing::error;

#[derive(Serialize)]
struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    if state.store.is_ready().await {
        (StatusCode::OK, Json(HealthResponse { status: "ready" })).into_response()
    } else {
        error!(root = %state.store.root().display(), "session directory readiness check failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "not_ready",
            }),
        )
            .into_response()
    }
}
