use crate::save::detect::{
    Compression, MAGIC_ZLIB, SAVE_TYPE_DOUBLE, SaveVariantInfo, detect_save_variant,
};
use crate::save::error::ConvertError;
use byteorder::{LittleEndian, WriteBytesExt};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use oozextract::Extractor;
use std::io::{Read, Write};

/// Largest GVAS body a save may declare or inflate to unless configured otherwise.
pub const DEFAULT_MAX_DECODED_BYTES: usize = 1024 * 1024 * 1024;

/// Strips the Palworld container and returns the GVAS bytes inside it.
///
/// The header's `uncompressed_size` is checked against `max_decoded` before any
/// buffer is sized from it, and no decompression pass may produce more than that.
pub fn decode_to_gvas(bytes: &[u8], max_decoded: usize) -> Result<Vec<u8>, ConvertError> {
    let variant = detect_save_variant(bytes);
    let Some(payload) = variant.payload(bytes) else {
        return Err(ConvertError::Container(
            "payload boundaries are invalid".to_string(),
        ));
    };

    let expected = match (variant.compression, variant.uncompressed_size) {
        (Compression::Unknown, _) => return Err(unsupported_container(&variant)),
        (_, Some(size)) => size as usize,
        (_, None) => {
            return Err(ConvertError::Container(
                "header carries no uncompressed size".to_string(),
            ));
        }
    };
    if expected > max_decoded {
        return Err(ConvertError::Decompress(format!(
            "declared size of {} bytes exceeds the {} byte limit",
            expected, max_decoded
        )));
    }

    let decoded = match variant.compression {
        Compression::Zlib { passes } => decode_plz(payload, passes, expected, max_decoded)?,
        Compression::Oodle => decode_plm(payload, expected)?,
        Compression::Unknown => return Err(unsupported_container(&variant)),
    };

    if decoded.len() != expected {
        return Err(ConvertError::Decompress(format!(
            "decoded byte count mismatch: expected {} bytes, got {} bytes",
            expected,
            decoded.len()
        )));
    }

    Ok(decoded)
}

fn unsupported_container(variant: &SaveVariantInfo) -> ConvertError {
    ConvertError::Container(format!(
        "magic {:?} with save type {:?} is not supported",
        variant.magic, variant.save_type
    ))
}

/// Wraps GVAS bytes in a double-pass zlib (`PlZ`, `0x32`) container.
pub fn encode_gvas(gvas: &[u8]) -> Result<Vec<u8>, ConvertError> {
    let uncompressed_len = u32::try_from(gvas.len())
        .map_err(|_| ConvertError::Encode("GVAS payload exceeds 4 GiB".to_string()))?;
    let first_pass = zlib_compress(gvas)?;
    let compressed_len = u32::try_from(first_pass.len())
        .map_err(|_| ConvertError::Encode("compressed payload exceeds 4 GiB".to_string()))?;
    let second_pass = zlib_compress(&first_pass)?;

    let mut output = Vec::with_capacity(12 + second_pass.len());
    let header_error =
        |error: std::io::Error| ConvertError::Encode(format!("failed to write header: {}", error));
    output
        .write_u32::<LittleEndian>(uncompressed_len)
        .map_err(header_error)?;
    output
        .write_u32::<LittleEndian>(compressed_len)
        .map_err(header_error)?;
    output.extend_from_slice(MAGIC_ZLIB);
    output.push(SAVE_TYPE_DOUBLE);
    output.extend_from_slice(&second_pass);
    Ok(output)
}

/// The first pass of a double-zlib payload is bounded by `max_decoded`, the
/// last pass by the declared GVAS size.
fn decode_plz(
    payload: &[u8],
    passes: u8,
    expected: usize,
    max_decoded: usize,
) -> Result<Vec<u8>, ConvertError> {
    if passes < 2 {
        return zlib_decompress(payload, expected)
            .map_err(|error| ConvertError::Decompress(format!("zlib decode failed: {}", error)));
    }

    let first_pass = zlib_decompress(payload, max_decoded)
        .map_err(|error| ConvertError::Decompress(format!("zlib decode failed: {}", error)))?;
    zlib_decompress(&first_pass, expected).map_err(|error| {
        ConvertError::Decompress(format!("zlib second-pass decode failed: {}", error))
    })
}

fn decode_plm(payload: &[u8], expected: usize) -> Result<Vec<u8>, ConvertError> {
    let mut output = vec![0u8; expected];
    let mut extractor = Extractor::new();
    let bytes_written = extractor
        .read_from_slice(payload, output.as_mut_slice())
        .map_err(|error| ConvertError::Decompress(format!("oodle decode failed: {}", error)))?;

    if bytes_written != output.len() {
        return Err(ConvertError::Decompress(format!(
            "oodle decoded byte count mismatch: expected {} bytes, got {} bytes",
            output.len(),
            bytes_written
        )));
    }

    Ok(output)
}

/// Inflates at most `limit` bytes; a stream that would produce more is an error.
fn zlib_decompress(payload: &[u8], limit: usize) -> std::io::Result<Vec<u8>> {
    let mut output = Vec::new();
    ZlibDecoder::new(payload)
        .take(limit as u64 + 1)
        .read_to_end(&mut output)?;
    if output.len() > limit {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("inflated data exceeds {} bytes", limit),
        ));
    }
    Ok(output)
}

fn zlib_compress(payload: &[u8]) -> Result<Vec<u8>, ConvertError> {
    let encode_error =
        |error: std::io::Error| ConvertError::Encode(format!("zlib encode failed: {}", error));
    let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(payload).map_err(encode_error)?;
    encoder.finish().map_err(encode_error)
}
