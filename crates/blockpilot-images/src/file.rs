//! The handle to a user-chosen file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ImageError, ImageResult};

/// A file the user picked from the selection surface.
///
/// Carries the metadata a picker hands over before any content is read: file
/// name, declared MIME type, and byte size. The declared type is derived from
/// the file extension; content-level enforcement happens later in the
/// pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    /// File name, without directories
    pub name: String,
    /// Declared MIME type in `type/subtype` form
    pub mime: String,
    /// File size in bytes
    pub size_bytes: u64,
    /// Path the file was chosen from
    pub path: PathBuf,
}

impl SelectedFile {
    /// Build a handle for a file on disk.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the chosen file
    ///
    /// # Returns
    ///
    /// The handle with its declared MIME type and size, or an error if the
    /// path does not name a readable regular file.
    pub fn from_path(path: impl Into<PathBuf>) -> ImageResult<Self> {
        let path = path.into();

        if !path.exists() {
            return Err(ImageError::InvalidFile(format!(
                "file does not exist: {}",
                path.display()
            )));
        }
        if !path.is_file() {
            return Err(ImageError::InvalidFile(format!(
                "path is not a file: {}",
                path.display()
            )));
        }

        let metadata = std::fs::metadata(&path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = declared_mime(&path);

        Ok(Self {
            name,
            mime,
            size_bytes: metadata.len(),
            path,
        })
    }

    /// Primary segment of the declared MIME type (`image` in `image/png`).
    pub fn mime_category(&self) -> &str {
        self.mime.split('/').next().unwrap_or("")
    }

    /// Whether the declared MIME category is `image`.
    pub fn is_image(&self) -> bool {
        self.mime_category() == "image"
    }

    /// File size in MB.
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Declared MIME type for a path, from its extension.
///
/// Unknown extensions fall back to `application/octet-stream`, which never
/// passes the `image` category check.
pub fn declared_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn test_from_path_reads_metadata() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "board.png", &[0u8; 1234]);

        let file = SelectedFile::from_path(&path).unwrap();
        assert_eq!(file.name, "board.png");
        assert_eq!(file.mime, "image/png");
        assert_eq!(file.size_bytes, 1234);
        assert!(file.is_image());
    }

    #[test]
    fn test_from_path_nonexistent() {
        let result = SelectedFile::from_path("/nonexistent/board.png");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_path_directory() {
        let dir = TempDir::new().unwrap();
        let result = SelectedFile::from_path(dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_mime_category() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "notes.txt", b"hello");

        let file = SelectedFile::from_path(&path).unwrap();
        assert_eq!(file.mime, "text/plain");
        assert_eq!(file.mime_category(), "text");
        assert!(!file.is_image());
    }

    #[test]
    fn test_unknown_extension_is_not_image() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "data.bin", &[0u8; 8]);

        let file = SelectedFile::from_path(&path).unwrap();
        assert_eq!(file.mime, "application/octet-stream");
        assert!(!file.is_image());
    }
}
