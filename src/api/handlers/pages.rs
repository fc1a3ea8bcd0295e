use crate::AppState;
use crate::api::error::ApiError;
use axum::extract::{Path, Query, State};
use axum::response::Html;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct EditQuery {
    saved: Option<String>,
}

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let html = state
        .views
        .index()
        .map_err(|error| ApiError::Internal(error.into()))?;
    Ok(Html(html))
}

pub async fn edit_page(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<EditQuery>,
) -> Result<Html<String>, ApiError> {
    let session = state
        .store
        .read(&session_id)
        .await?
        .ok_or_else(ApiError::session_not_found)?;

    let saved = query.saved.as_deref() == Some("1");
    let html = state
        .views
        .edit(&session, saved)
        .map_err(|error| ApiError::Internal(error.into()))?;
    Ok(Html(html))
}
