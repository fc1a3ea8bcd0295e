use byteorder::{ByteOrder, LittleEndian};

pub const HEADER_LEN: usize = 12;
pub const CNK_PREFIX_LEN: usize = 12;

pub const MAGIC_ZLIB: &[u8; 3] = b"PlZ";
pub const MAGIC_OODLE: &[u8; 3] = b"PlM";

pub const SAVE_TYPE_SINGLE: u8 = 0x31;
pub const SAVE_TYPE_DOUBLE: u8 = 0x32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// zlib, applied once (`0x31`) or twice (`0x32`).
    Zlib { passes: u8 },
    Oodle,
    Unknown,
}

impl Compression {
    pub fn label(self) -> &'static str {
        match self {
            Compression::Zlib { .. } => "zlib",
            Compression::Oodle => "oodle",
            Compression::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SaveVariantInfo {
    pub has_cnk_prefix: bool,
    pub magic: Option<String>,
    pub save_type: Option<u8>,
    pub compression: Compression,
    pub uncompressed_size: Option<u32>,
    pub compressed_size: Option<u32>,
    pub payload_offset: usize,
    pub payload_len: usize,
}

impl SaveVariantInfo {
    fn unknown(has_cnk_prefix: bool, payload_offset: usize) -> Self {
        Self {
            has_cnk_prefix,
            magic: None,
            save_type: None,
            compression: Compression::Unknown,
            uncompressed_size: None,
            compressed_size: None,
            payload_offset,
            payload_len: 0,
        }
    }

    pub fn payload<'a>(&self, bytes: &'a [u8]) -> Option<&'a [u8]> {
        let end = self.payload_offset.checked_add(self.payload_len)?;
        if self.payload_offset >= end || end > bytes.len() {
            return None;
        }
        Some(&bytes[self.payload_offset..end])
    }
}

pub fn detect_save_variant(bytes: &[u8]) -> SaveVariantInfo {
    let has_cnk_prefix = bytes.starts_with(b"CNK");
    let header_offset = if has_cnk_prefix { CNK_PREFIX_LEN } else { 0 };
    let payload_offset = header_offset + HEADER_LEN;

    if bytes.len() < payload_offset {
        return SaveVariantInfo::unknown(has_cnk_prefix, payload_offset);
    }

    let header = &bytes[header_offset..payload_offset];
    let uncompressed_size = LittleEndian::read_u32(&header[0..4]);
    let compressed_size = LittleEndian::read_u32(&header[4..8]);
    let magic_bytes = &header[8..11];
    let save_type = header[11];

    let compression = match (magic_bytes, save_type) {
        (magic, SAVE_TYPE_SINGLE) if magic == MAGIC_ZLIB => Compression::Zlib { passes: 1 },
        (magic, SAVE_TYPE_DOUBLE) if magic == MAGIC_ZLIB => Compression::Zlib { passes: 2 },
        (magic, SAVE_TYPE_SINGLE) if magic == MAGIC_OODLE => Compression::Oodle,
        _ => Compression::Unknown,
    };

    // For double-pass saves the header records the inner stream length, so the
    // outer payload runs to the end of the file.
    let available_payload = bytes.len() - payload_offset;
    let requested_payload = compressed_size as usize;
    let payload_len = match compression {
        Compression::Zlib { passes: 2 } => available_payload,
        _ if requested_payload == 0 => available_payload,
        _ => requested_payload.min(available_payload),
    };

    SaveVariantInfo {
        has_cnk_prefix,
        magic: Some(String::from_utf8_lossy(magic_bytes).to_string()),
        save_type: Some(save_type),
        compression,
        uncompressed_size: Some(uncompressed_size),
        compressed_size: Some(compressed_size),
        payload_offset,
        payload_len,
    }
}
