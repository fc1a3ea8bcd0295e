use thiserror::Error;

/// Failure converting between a save container and JSON text.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unrecognized save container: {0}")]
    Container(String),

    #[error("{0}")]
    Decompress(String),

    #[error("GVAS parse failed: {0}")]
    Gvas(String),

    #[error("JSON conversion failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("save encoding failed: {0}")]
    Encode(String),
}
