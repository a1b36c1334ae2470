//! Image format detection from file content.

use crate::error::{ImageError, ImageResult};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG format
    Png,
    /// JPEG format
    Jpeg,
    /// GIF format
    Gif,
    /// WebP format
    WebP,
}

impl ImageFormat {
    /// Detect image format from magic bytes.
    pub fn detect_from_bytes(bytes: &[u8]) -> ImageResult<Self> {
        if bytes.len() < 4 {
            return Err(ImageError::InvalidFile(
                "file too small to be a valid image".to_string(),
            ));
        }

        // PNG: 89 50 4E 47
        if bytes.starts_with(&[0x89, 0x50, 0x4e, 0x47]) {
            return Ok(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
            return Ok(ImageFormat::Jpeg);
        }

        // GIF: GIF87a or GIF89a
        if bytes.starts_with(b"GIF") {
            return Ok(ImageFormat::Gif);
        }

        // WebP: RIFF ... WEBP
        if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && bytes[8..12] == *b"WEBP" {
            return Ok(ImageFormat::WebP);
        }

        Err(ImageError::InvalidFile(
            "unable to detect image format from file header".to_string(),
        ))
    }

    /// Get the format as a lowercase extension string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Gif => "gif",
            ImageFormat::WebP => "webp",
        }
    }

    /// MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Whether a file extension names this format.
    pub fn matches_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        match self {
            ImageFormat::Png => ext == "png",
            ImageFormat::Jpeg => ext == "jpg" || ext == "jpeg",
            ImageFormat::Gif => ext == "gif",
            ImageFormat::WebP => ext == "webp",
        }
    }
}
