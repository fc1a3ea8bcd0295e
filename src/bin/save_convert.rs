#[path = "../save/mod.rs"]
mod save;

use anyhow::{Context, Result, bail};
use save::converter::{GvasConverter, SaveConverter};
use save::detect::detect_save_variant;
use std::path::PathBuf;

/// Converts a save to JSON or JSON back to a save, outside the web app.
///
/// Usage: `save_convert <input.sav|input.json> [output]`
fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let Some(input) = args.get(1).map(PathBuf::from) else {
        bail!("usage: save_convert <input.sav|input.json> [output]");
    };
    let bytes = std::fs::read(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let converter = GvasConverter::new();

    let extension = input
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    let (output_bytes, output_extension) = match extension.as_deref() {
        Some("sav") => {
            let variant = detect_save_variant(&bytes);
            println!(
                "{} => magic={:?} save_type={:?} compression={} cnk_prefix={}",
                input.display(),
                variant.magic,
                variant.save_type,
                variant.compression.label(),
                variant.has_cnk_prefix
            );
            let text = converter
                .sav_to_json(&bytes)
                .with_context(|| format!("failed to convert {}", input.display()))?;
            (text.into_bytes(), "json")
        }
        Some("json") => {
            let text = std::str::from_utf8(&bytes)
                .with_context(|| format!("{} is not UTF-8", input.display()))?;
            let save = converter
                .json_to_sav(text)
                .with_context(|| format!("failed to convert {}", input.display()))?;
            (save, "sav")
        }
        _ => bail!("input must have a .sav or .json extension"),
    };

    let output = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| input.with_extension(output_extension));
    std::fs::write(&output, &output_bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("wrote {} bytes to {}", output_bytes.len(), output.display());
    Ok(())
}
