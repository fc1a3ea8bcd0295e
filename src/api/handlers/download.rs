use crate::AppState;
use crate::api::error::ApiError;
use crate::api::handlers::run_conversion;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::path::Path as FsPath;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    format: Option<String>,
}

pub async fn download(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let session = state
        .store
        .read(&session_id)
        .await?
        .ok_or_else(ApiError::session_not_found)?;

    let format = query.format.as_deref().unwrap_or("json");
    let (content, extension, media_type) = match format {
        "json" => (
            session.json_text.into_bytes(),
            "json",
            "application/json",
        ),
        "sav" => {
            let json_text = session.json_text;
            let content = run_conversion(&state.converter, move |converter| {
                converter.json_to_sav(&json_text)
            })
            .await?
            .map_err(|error| {
                warn!(session_id = %session.session_id, error = %error, "save export failed");
                ApiError::conversion("Could not export save", error)
            })?;
            (content, "sav", "application/octet-stream")
        }
        _ => return Err(ApiError::bad_request("Unsupported format requested")),
    };

    let filename = attachment_name(&session.filename, extension);
    info!(
        session_id = %session.session_id,
        format,
        bytes = content.len(),
        "session downloaded"
    );

    Ok((
        [
            (header::CONTENT_TYPE, media_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        content,
    )
        .into_response())
}

/// Stored filename with its extension replaced, reduced to characters that are safe
/// inside a quoted header value.
fn attachment_name(stored: &str, extension: &str) -> String {
    let renamed = FsPath::new(stored).with_extension(extension);
    let name = renamed
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("session.{}", extension));

    name.chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
