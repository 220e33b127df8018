//! Content type allowlist for uploaded assets.

use std::fmt;
use std::path::Path;

/// Content types accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// `image/jpeg` (`.jpeg`, `.jpg`).
    Image,
    /// `application/json` (`.json`).
    Json,
}

impl ContentType {
    /// Resolves the content type from a file extension.
    ///
    /// Returns `None` for anything outside the allowlist.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("jpeg" | "jpg") => Some(Self::Image),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }

    /// MIME string sent as `Content-Type`.
    pub fn mime(self) -> &'static str {
        match self {
            Self::Image => "image/jpeg",
            Self::Json => "application/json",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlisted_extensions() {
        assert_eq!(
            ContentType::from_path(Path::new("tokens/1.jpeg")),
            Some(ContentType::Image)
        );
        assert_eq!(
            ContentType::from_path(Path::new("banner.JPG")),
            Some(ContentType::Image)
        );
        assert_eq!(
            ContentType::from_path(Path::new("metadata.json")),
            Some(ContentType::Json)
        );
    }

    #[test]
    fn rejects_other_extensions() {
        assert_eq!(ContentType::from_path(Path::new("image.png")), None);
        assert_eq!(ContentType::from_path(Path::new(".DS_Store")), None);
        assert_eq!(ContentType::from_path(Path::new("README")), None);
    }

    #[test]
    fn mime_strings() {
        assert_eq!(ContentType::Image.mime(), "image/jpeg");
        assert_eq!(ContentType::Json.to_string(), "application/json");
    }
}
