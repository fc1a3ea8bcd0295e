use crate::AppState;
use crate::api::error::ApiError;
use crate::api::handlers::pretty_json;
use axum::Form;
use axum::extract::{Path, State};
use axum::response::Redirect;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct EditForm {
    json_body: String,
}

pub async fn save_edit(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Form(form): Form<EditForm>,
) -> Result<Redirect, ApiError> {
    let normalized = pretty_json(&form.json_body)
        .map_err(|error| ApiError::bad_request(format!("JSON validation failed: {}", error)))?;

    let session = state.store.update_json(&session_id, normalized).await?;
    info!(
        session_id = %session.session_id,
        json_bytes = session.json_text.len(),
        "session payload saved"
    );

    Ok(Redirect::to(&format!(
        "/edit/{}?saved=1",
        session.session_id
    )))
}
