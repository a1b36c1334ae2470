//! Error types for image attachment operations.

use thiserror::Error;

/// Result type for image attachment operations.
pub type ImageResult<T> = Result<T, ImageError>;

/// Errors that can occur while selecting, validating, or encoding an image.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Chosen file's MIME category is not `image`.
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    /// Chosen file exceeds the attachment size cap.
    #[error("file too large: {size_bytes} bytes exceeds maximum of {max_bytes} bytes")]
    TooLarge { size_bytes: u64, max_bytes: u64 },

    /// The read finished without producing a usable payload.
    #[error("read produced an empty payload")]
    EmptyRead,

    /// The read itself failed.
    #[error("failed to read image: {0}")]
    Read(String),

    /// File is missing, not a regular file, or not recognizable as an image.
    #[error("invalid image file: {0}")]
    InvalidFile(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ImageError {
    /// User-facing alert text for failures that abort a selection attempt.
    ///
    /// Alert messages stay in the product's UI language; diagnostic text in
    /// `Display` stays English for logs.
    pub fn alert_text(&self) -> &'static str {
        match self {
            ImageError::UnsupportedType(_) => "只支持图片文件",
            ImageError::TooLarge { .. } => "文件大小不能超过2MB",
            ImageError::EmptyRead | ImageError::Read(_) | ImageError::Io(_) => "图片读取失败",
            _ => "图片处理失败",
        }
    }
}

impl From<serde_yaml::Error> for ImageError {
    fn from(err: serde_yaml::Error) -> Self {
        ImageError::Config(err.to_string())
    }
}
