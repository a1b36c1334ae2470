//! Asynchronous read-to-data-URL abstraction.

use async_trait::async_trait;

use crate::encode::{encode_data_url, EncodedImage};
use crate::error::{ImageError, ImageResult};
use crate::file::SelectedFile;

/// Reads a chosen file and materializes it as a data URL.
///
/// The selection pipeline only ever has one read in flight, and a read has no
/// cancellation handle; implementations just resolve once with the result.
/// An empty payload is an error here rather than a silent non-result, so
/// hosts always learn why no completion callback fired.
#[async_trait]
pub trait ImageReader: Send + Sync {
    /// Read the file's content and encode it with the file's declared MIME
    /// type.
    async fn read_as_data_url(&self, file: &SelectedFile) -> ImageResult<EncodedImage>;
}

/// Filesystem-backed reader.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageReader;

#[async_trait]
impl ImageReader for FsImageReader {
    async fn read_as_data_url(&self, file: &SelectedFile) -> ImageResult<EncodedImage> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|e| ImageError::Read(e.to_string()))?;

        if bytes.is_empty() {
            return Err(ImageError::EmptyRead);
        }

        Ok(encode_data_url(&file.mime, &bytes))
    }
}
