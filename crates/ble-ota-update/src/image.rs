//! Firmware images loaded into memory.

use std::path::Path;
use std::sync::OnceLock;

use ble_ota_protocol::packet_count;
use md5::{Digest, Md5};
use regex::bytes::Regex;
use tracing::debug;

use crate::error::OtaError;
use crate::version::VersionCode;

/// Patterns used to find a version string inside a binary, most specific
/// first. The build system stamps one of these into the image.
const VERSION_PATTERNS: [&str; 3] = [
    r"(?-u)VERSION[=:]\s*([0-9]+\.[0-9]+\.[0-9]+[^\x00\s]*)",
    r"(?-u)FW_VERSION[=:]\s*([0-9]+\.[0-9]+\.[0-9]+[^\x00\s]*)",
    r"(?-u)([0-9]+\.[0-9]+\.[0-9]+\.[0-9]+-[A-Z0-9]+)",
];

fn version_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        VERSION_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

/// Search a binary for an embedded version string.
///
/// Each pattern is tried in order and only its first match is considered; a
/// match that is not valid UTF-8 moves on to the next pattern.
pub fn find_embedded_version(data: &[u8]) -> Option<VersionCode> {
    version_patterns().iter().find_map(|re| {
        let caps = re.captures(data)?;
        let text = std::str::from_utf8(caps.get(1)?.as_bytes()).ok()?;
        Some(VersionCode::parse(text))
    })
}

/// MD5 of `data` as lowercase hex.
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Immutable firmware image with derived checksum and embedded version.
#[derive(Debug, Clone)]
pub struct FirmwareImage {
    data: Vec<u8>,
    checksum: String,
    embedded_version: Option<VersionCode>,
    name: Option<String>,
}

impl FirmwareImage {
    /// Build an image from raw bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, OtaError> {
        if data.is_empty() {
            return Err(OtaError::EmptyImage);
        }
        let checksum = md5_hex(&data);
        let embedded_version = find_embedded_version(&data);
        Ok(Self {
            data,
            checksum,
            embedded_version,
            name: None,
        })
    }

    /// Load an image from disk, recording the file name.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, OtaError> {
        let path = path.as_ref();
        let data = match tokio::fs::read(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OtaError::FileNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(OtaError::Io(e)),
        };

        let image = Self::from_bytes(data)?;
        let image = match path.file_name() {
            Some(name) => image.with_name(name.to_string_lossy()),
            None => image,
        };
        debug!(
            image = image.name().unwrap_or_default(),
            size = image.size(),
            md5 = %image.checksum,
            version = ?image.embedded_version.as_ref().map(VersionCode::as_str),
            "Loaded firmware image"
        );
        Ok(image)
    }

    /// Attach a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Raw image bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Image size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Lowercase hex MD5 of the image. Used for display and history only.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Version string found inside the image, if any.
    pub fn embedded_version(&self) -> Option<&VersionCode> {
        self.embedded_version.as_ref()
    }

    /// Source file name, if known.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Number of Data packets this image produces at `chunk_size`.
    pub fn packet_count(&self, chunk_size: usize) -> usize {
        packet_count(self.data.len(), chunk_size)
    }
}
