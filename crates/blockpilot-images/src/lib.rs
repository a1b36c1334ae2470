//! Image attachment support for blockpilot.
//!
//! This crate provides the selection pipeline that turns a user-chosen file
//! into a base64 data URL ready to attach to a chat message:
//! - MIME and size validation with user-facing alerts
//! - Asynchronous read-to-data-URL encoding
//! - Magic-byte format detection (PNG, JPG, GIF, WebP)
//! - YAML configuration with a user/project hierarchy

pub mod config;
pub mod encode;
pub mod error;
pub mod file;
pub mod formats;
pub mod reader;
pub mod selector;

pub use config::{AttachmentConfig, FormatsConfig, ImageConfig};
pub use encode::{encode_data_url, EncodedImage};
pub use error::{ImageError, ImageResult};
pub use file::SelectedFile;
pub use formats::ImageFormat;
pub use reader::{FsImageReader, ImageReader};
pub use selector::{ImageSelector, SelectCallback, SelectorState, DEFAULT_MAX_ATTACHMENT_BYTES};
