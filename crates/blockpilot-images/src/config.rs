//! Configuration for image attachment support.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ImageResult;
use crate::selector::DEFAULT_MAX_ATTACHMENT_BYTES;

/// Image attachment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Attachment limits
    pub attachment: AttachmentConfig,
    /// Advisory format filter for the selection surface
    pub formats: FormatsConfig,
}

/// Attachment limits configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentConfig {
    /// Maximum attachment size in bytes (2 MiB)
    pub max_bytes: u64,
}

/// Advisory format filter configuration.
///
/// Controls which extensions the selection surface offers, the way a file
/// dialog's `image/*` filter does. Enforcement stays with the MIME category
/// check in the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatsConfig {
    /// Extensions shown by the selection surface
    pub supported: Vec<String>,
}

#[allow(clippy::derivable_impls)]
impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            attachment: AttachmentConfig::default(),
            formats: FormatsConfig::default(),
        }
    }
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
        }
    }
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            supported: vec![
                "png".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
                "gif".to_string(),
                "webp".to_string(),
            ],
        }
    }
}

impl ImageConfig {
    /// Load configuration from a YAML file.
    ///
    /// Returns defaults if the file doesn't exist.
    pub fn from_file(path: &PathBuf) -> ImageResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with hierarchy support.
    ///
    /// Configuration hierarchy (highest to lowest priority):
    /// 1. Project-level config (config/images.yaml)
    /// 2. User-level config (~/.blockpilot/config/images.yaml)
    /// 3. Built-in defaults
    pub fn load_with_hierarchy() -> ImageResult<Self> {
        let mut config = Self::default();

        if let Some(home) = dirs::home_dir() {
            let user_config_path = home.join(".blockpilot").join("config").join("images.yaml");
            if let Ok(user_config) = Self::from_file(&user_config_path) {
                config = Self::merge(config, user_config);
            }
        }

        let project_config_path = PathBuf::from("config/images.yaml");
        if let Ok(project_config) = Self::from_file(&project_config_path) {
            config = Self::merge(config, project_config);
        }

        Ok(config)
    }

    /// Whether an extension passes the advisory filter.
    pub fn is_extension_supported(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.formats.supported.iter().any(|s| s == &ext)
    }

    /// Merge two configurations, with `override_config` taking precedence.
    fn merge(mut base: Self, override_config: Self) -> Self {
        if override_config.attachment.max_bytes != 0 {
            base.attachment = override_config.attachment;
        }
        if !override_config.formats.supported.is_empty() {
            base.formats = override_config.formats;
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_cap_is_two_mib() {
        let config = ImageConfig::default();
        assert_eq!(config.attachment.max_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_default_formats() {
        let config = ImageConfig::default();
        assert!(config.is_extension_supported("png"));
        assert!(config.is_extension_supported("JPEG"));
        assert!(!config.is_extension_supported("txt"));
    }

    #[test]
    fn test_from_file_missing_gives_defaults() {
        let config = ImageConfig::from_file(&PathBuf::from("/nonexistent/images.yaml")).unwrap();
        assert_eq!(config.attachment.max_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_from_file_parses_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "attachment:\n  max_bytes: 1048576\nformats:\n  supported: [png]").unwrap();

        let config = ImageConfig::from_file(&path).unwrap();
        assert_eq!(config.attachment.max_bytes, 1048576);
        assert_eq!(config.formats.supported, vec!["png"]);
    }

    #[test]
    fn test_merge_override_wins() {
        let base = ImageConfig::default();
        let override_config = ImageConfig {
            attachment: AttachmentConfig { max_bytes: 512 },
            formats: FormatsConfig {
                supported: vec!["png".to_string()],
            },
        };

        let merged = ImageConfig::merge(base, override_config);
        assert_eq!(merged.attachment.max_bytes, 512);
        assert_eq!(merged.formats.supported.len(), 1);
    }

    #[test]
    fn test_merge_empty_override_keeps_base() {
        let base = ImageConfig::default();
        let override_config = ImageConfig {
            attachment: AttachmentConfig { max_bytes: 0 },
            formats: FormatsConfig { supported: vec![] },
        };

        let merged = ImageConfig::merge(base, override_config);
        assert_eq!(merged.attachment.max_bytes, 2 * 1024 * 1024);
        assert!(!merged.formats.supported.is_empty());
    }
}
