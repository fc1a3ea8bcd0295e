use crate::save::container::{DEFAULT_MAX_DECODED_BYTES, decode_to_gvas, encode_gvas};
use crate::save::error::ConvertError;
use crate::save::hints::{palworld_hints, parse_with_auto_hints};
use gvas::GvasFile;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Converts between binary Palworld saves and editable JSON text.
pub trait SaveConverter: Send + Sync {
    fn sav_to_json(&self, bytes: &[u8]) -> Result<String, ConvertError>;
    fn json_to_sav(&self, text: &str) -> Result<Vec<u8>, ConvertError>;
}

/// Container codec plus `gvas` parsing; the JSON shape is the serde form of [`GvasFile`].
///
/// Hints inferred while reading one save are kept and handed to the parser for
/// every later save, so each missing path is only discovered once per process.
pub struct GvasConverter {
    table_hints: HashMap<String, String>,
    learned_hints: Mutex<HashMap<String, String>>,
    max_decoded_bytes: usize,
}

impl GvasConverter {
    pub fn new() -> Self {
        Self {
            table_hints: palworld_hints(),
            learned_hints: Mutex::new(HashMap::new()),
            max_decoded_bytes: DEFAULT_MAX_DECODED_BYTES,
        }
    }

    pub fn with_max_decoded_bytes(mut self, max_decoded_bytes: usize) -> Self {
        self.max_decoded_bytes = max_decoded_bytes;
        self
    }

    fn known_hints(&self) -> HashMap<String, String> {
        let mut hints = self.table_hints.clone();
        hints.extend(
            self.learned()
                .iter()
                .map(|(path, hint)| (path.clone(), hint.clone())),
        );
        hints
    }

    fn remember_hints(&self, inferred: HashMap<String, String>) {
        if inferred.is_empty() {
            return;
        }
        let mut learned = self.learned();
        learned.extend(inferred);
        debug!(learned = learned.len(), "cached inferred GVAS hints");
    }

    fn learned(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.learned_hints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for GvasConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl SaveConverter for GvasConverter {
    fn sav_to_json(&self, bytes: &[u8]) -> Result<String, ConvertError> {
        let gvas_bytes = decode_to_gvas(bytes, self.max_decoded_bytes)?;
        let parsed = parse_with_auto_hints(&gvas_bytes, &self.known_hints())?;
        self.remember_hints(parsed.inferred);
        let text = serde_json::to_string_pretty(&parsed.gvas)?;
        debug!(
            save_bytes = bytes.len(),
            gvas_bytes = gvas_bytes.len(),
            json_bytes = text.len(),
            "converted save to JSON"
        );
        Ok(text)
    }

    fn json_to_sav(&self, text: &str) -> Result<Vec<u8>, ConvertError> {
        let gvas: GvasFile = serde_json::from_str(text)?;
        let mut writer = Cursor::new(Vec::new());
        gvas.write(&mut writer)
            .map_err(|error| ConvertError::Encode(format!("GVAS write failed: {}", error)))?;
        let gvas_bytes = writer.into_inner();
        let encoded = encode_gvas(&gvas_bytes)?;
        debug!(
            gvas_bytes = gvas_bytes.len(),
            save_bytes = encoded.len(),
            "converted JSON to save"
        );
        Ok(encoded)
    }
}
