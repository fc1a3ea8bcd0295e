use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Format of the file a session was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Sav,
    Json,
}

impl SourceFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceFormat::Sav => "sav",
            SourceFormat::Json => "json",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One uploaded file's editable JSON text plus the metadata needed to export it again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub json_text: String,
    pub source_format: SourceFormat,
    pub filename: String,
}

impl Session {
    /// Builds a session with a freshly generated id. An empty filename falls back to
    /// `session-{id}.json`.
    pub fn create(json_text: String, source_format: SourceFormat, filename: Option<String>) -> Self {
        let session_id = new_session_id();
        let filename = filename
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("session-{}.json", session_id));

        Self {
            session_id,
            json_text,
            source_format,
            filename,
        }
    }
}

pub fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_simple_hex() {
        let id = new_session_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn missing_filename_falls_back_to_session_name() {
        let session = Session::create("{}".to_string(), SourceFormat::Json, None);
        assert_eq!(session.filename, format!("session-{}.json", session.session_id));

        let session = Session::create("{}".to_string(), SourceFormat::Json, Some("  ".into()));
        assert!(session.filename.starts_with("session-"));
    }

    #[test]
    fn source_format_serializes_lowercase() {
        let session = Session {
            session_id: "abc".to_string(),
            json_text: "{}".to_string(),
            source_format: SourceFormat::Sav,
            filename: "Level.sav".to_string(),
        };
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["source_format"], "sav");
        assert_eq!(value["filename"], "Level.sav");
    }
}
