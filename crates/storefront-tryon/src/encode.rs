//! Data URL encoding of uploaded images.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{TryOnError, TryOnResult};

/// Mime type used when the upload does not declare one.
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// An image file uploaded by the shopper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    /// Declared content type, e.g. `image/jpeg`.
    pub content_type: Option<String>,
}

impl UploadedImage {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: Option<&str>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.map(str::to_string),
        }
    }

    /// Declared mime type without parameters, or the fallback.
    pub fn mime_type(&self) -> &str {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .filter(|mime| !mime.is_empty())
            .unwrap_or(FALLBACK_MIME)
    }

    /// Encode as `data:<mime>;base64,<payload>`.
    pub fn to_data_url(&self) -> TryOnResult<String> {
        if self.bytes.is_empty() {
            return Err(TryOnError::EmptyImage);
        }
        Ok(format!(
            "data:{};base64,{}",
            self.mime_type(),
            STANDARD.encode(&self.bytes)
        ))
    }
}

/// Mime type of a data URL.
pub fn data_url_mime_type(data_url: &str) -> Option<&str> {
    data_url
        .strip_prefix("data:")?
        .split([';', ','])
        .next()
        .filter(|mime| !mime.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodes_with_declared_mime() {
        let image = UploadedImage::new(b"hello".to_vec(), Some("image/png"));
        assert_eq!(image.to_data_url().unwrap(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn test_fallback_mime() {
        let image = UploadedImage::new(vec![1, 2, 3], None);
        let url = image.to_data_url().unwrap();
        assert!(url.starts_with("data:application/octet-stream;base64,"));
        assert_eq!(data_url_mime_type(&url), Some("application/octet-stream"));

        let blank = UploadedImage::new(vec![1], Some(" ; charset=binary"));
        assert_eq!(blank.mime_type(), FALLBACK_MIME);
    }

    #[test]
    fn test_empty_file_is_an_error() {
        let image = UploadedImage::new(Vec::new(), Some("image/jpeg"));
        assert!(matches!(image.to_data_url(), Err(TryOnError::EmptyImage)));
    }

    #[test]
    fn test_mime_of_data_url() {
        assert_eq!(data_url_mime_type("data:image/webp;base64,UklGR"), Some("image/webp"));
        assert_eq!(data_url_mime_type("https://example.com/a.png"), None);
    }
}
