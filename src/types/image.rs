//! Image helpers: file loading, MIME detection, base64 conversion.

use std::path::Path;

use base64::Engine;

use super::message::ImageContent;
use crate::error::{Result, TinselError};

/// Guess an image MIME type from a file extension. Unknown extensions map to PNG,
/// which is what the image model emits.
pub fn mime_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        Some("svg") => "image/svg+xml",
        _ => "image/png",
    }
}

impl ImageContent {
    /// Encode raw bytes.
    pub fn from_bytes(data: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(data),
            mime_type: mime_type.into(),
        }
    }

    /// Read an image file from disk.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::from_bytes(&bytes, mime_type_for_path(path)))
    }

    /// Decode the base64 payload.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| TinselError::InvalidArgument(format!("invalid base64 image data: {e}")))
    }
}
