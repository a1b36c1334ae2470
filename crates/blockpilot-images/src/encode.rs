//! Base64 data-URL encoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// An image fully materialized as a `data:<mime>;base64,<payload>` string.
///
/// Created per selection event, never cached. The whole payload lives in
/// memory before it is handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedImage(String);

impl EncodedImage {
    /// The full data URL.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the data URL.
    pub fn into_string(self) -> String {
        self.0
    }

    /// MIME type embedded in the data URL.
    pub fn mime(&self) -> Option<&str> {
        self.0.strip_prefix("data:")?.split(';').next()
    }

    /// Base64 payload after the `;base64,` marker.
    pub fn payload(&self) -> Option<&str> {
        let idx = self.0.find(";base64,")?;
        Some(&self.0[idx + ";base64,".len()..])
    }
}

impl std::fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode raw bytes as a data URL with the given MIME type.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> EncodedImage {
    EncodedImage(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_shape() {
        let encoded = encode_data_url("image/png", b"pngdata");
        assert!(encoded.as_str().starts_with("data:image/png;base64,"));
        assert!(encoded.as_str().contains(";base64,"));
    }

    #[test]
    fn test_mime_and_payload_accessors() {
        let encoded = encode_data_url("image/jpeg", &[0xff, 0xd8, 0xff]);
        assert_eq!(encoded.mime(), Some("image/jpeg"));
        let payload = encoded.payload().unwrap();
        assert_eq!(STANDARD.decode(payload).unwrap(), vec![0xff, 0xd8, 0xff]);
    }

    #[test]
    fn test_empty_bytes_give_empty_payload() {
        let encoded = encode_data_url("image/png", b"");
        assert_eq!(encoded.payload(), Some(""));
    }
}
