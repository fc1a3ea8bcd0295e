use crate::AppState;
use crate::api::error::ApiError;
use crate::api::handlers::{pretty_json, run_conversion};
use crate::storage::session::{Session, SourceFormat};
use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Redirect};
use std::path::Path;
use tracing::{info, warn};

const FILE_FIELD: &str = "file";

struct UploadedFile {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

pub async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let uploaded = read_upload(&state, multipart).await?;
    let extension = uploaded
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

    let (json_text, source_format) = match extension.as_deref() {
        Some("sav") => {
            let bytes = uploaded.bytes;
            let json_text = run_conversion(&state.converter, move |converter| {
                converter.sav_to_json(&bytes)
            })
            .await?
            .map_err(|error| {
                warn!(error = %error, "save upload could not be converted");
                ApiError::conversion("Failed to read save", error)
            })?;
            (json_text, SourceFormat::Sav)
        }
        Some("json") => {
            let text = std::str::from_utf8(&uploaded.bytes).map_err(|error| {
                ApiError::bad_request(format!("Invalid JSON upload: {}", error))
            })?;
            let text = text.strip_prefix('\u{feff}').unwrap_or(text);
            let json_text = pretty_json(text).map_err(|error| {
                ApiError::bad_request(format!("Invalid JSON upload: {}", error))
            })?;
            (json_text, SourceFormat::Json)
        }
        _ => {
            return Err(ApiError::bad_request(
                "Only .sav or .json files are supported",
            ));
        }
    };

    let session = Session::create(json_text, source_format, uploaded.file_name);
    state.store.write(&session).await?;
    info!(
        session_id = %session.session_id,
        source_format = %session.source_format,
        filename = %session.filename,
        json_bytes = session.json_text.len(),
        "session created from upload"
    );

    Ok(Redirect::to(&format!("/edit/{}", session.session_id)))
}

async fn read_upload(state: &AppState, mut multipart: Multipart) -> Result<UploadedFile, ApiError> {
    let mut uploaded: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(|error| {
        ApiError::bad_request(format!("failed to read multipart form data: {}", error))
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        if uploaded.is_some() {
            return Err(ApiError::bad_request(
                "multipart request must contain exactly one file field",
            ));
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|error| {
                ApiError::bad_request(format!("failed to read uploaded file bytes: {}", error))
            })?
            .to_vec();

        if bytes.len() > state.max_upload_bytes {
            return Err(ApiError::bad_request(format!(
                "uploaded file is too large ({} bytes > {} bytes)",
                bytes.len(),
                state.max_upload_bytes
            )));
        }

        uploaded = Some(UploadedFile { file_name, bytes });
    }

    uploaded.ok_or_else(|| ApiError::bad_request("multipart request did not include a file"))
}
