use crate::save::container::DEFAULT_MAX_DECODED_BYTES;
use anyhow::{Context, Result};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: Ipv4Addr,
    pub port: u16,
    pub session_dir: PathBuf,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Upper bound on the GVAS size a save may declare or decompress to.
    pub max_decoded_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("APP_PORT").unwrap_or_else(|_| "8080".to_string());
        let session_dir = std::env::var("SESSION_DIR").unwrap_or_else(|_| "sessions".to_string());
        let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string());
        let max_upload_bytes = match std::env::var("MAX_UPLOAD_BYTES") {
            Ok(value) => value
                .parse()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let max_decoded_bytes = match std::env::var("MAX_DECODED_BYTES") {
            Ok(value) => value
                .parse()
                .context("MAX_DECODED_BYTES must be a byte count")?,
            Err(_) => DEFAULT_MAX_DECODED_BYTES,
        };

        Ok(Self {
            host: host
                .parse()
                .context("APP_HOST must be a valid IPv4 address")?,
            port: port.parse().context("APP_PORT must be a valid u16")?,
            session_dir: PathBuf::from(session_dir),
            static_dir: PathBuf::from(static_dir),
            max_upload_bytes,
            max_decoded_bytes,
        })
    }
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let use_json = std::env::var("LOG_JSON")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if use_json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}
