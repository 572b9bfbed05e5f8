//! Image descriptors and extracted image payloads.

use serde::{Deserialize, Serialize};

/// Format tag used when a backend does not report one.
pub const DEFAULT_FORMAT: &str = "png";

/// PDF cross-reference identifier: object number plus generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Xref {
    /// Object number
    pub num: u32,
    /// Generation number
    pub gen: u16,
}

impl Xref {
    /// Create a new cross-reference identifier.
    pub fn new(num: u32, gen: u16) -> Self {
        Self { num, gen }
    }
}

impl From<(u32, u16)> for Xref {
    fn from((num, gen): (u32, u16)) -> Self {
        Self { num, gen }
    }
}

impl From<Xref> for (u32, u16) {
    fn from(xref: Xref) -> Self {
        (xref.num, xref.gen)
    }
}

impl std::fmt::Display for Xref {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.num, self.gen)
    }
}

/// One embedded image as listed on a page, before its data is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    /// Cross-reference identifier of the image stream
    pub xref: Xref,

    /// Resource name on the page (e.g., "Im0")
    pub name: String,

    /// Width in pixels, if declared
    pub width: Option<u32>,

    /// Height in pixels, if declared
    pub height: Option<u32>,
}

impl ImageRef {
    /// Create a descriptor with no declared dimensions.
    pub fn new(xref: impl Into<Xref>, name: impl Into<String>) -> Self {
        Self {
            xref: xref.into(),
            name: name.into(),
            width: None,
            height: None,
        }
    }

    /// Set declared dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// Encoded image bytes plus the format tag describing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// Encoded bytes, written to disk verbatim
    pub data: Vec<u8>,

    /// Format tag (e.g., "png", "jpeg"); `None` if the backend can't tell
    pub format: Option<String>,

    /// Width in pixels (if known)
    pub width: Option<u32>,

    /// Height in pixels (if known)
    pub height: Option<u32>,
}

impl ExtractedImage {
    /// Create an image with an optional format tag.
    pub fn new(data: Vec<u8>, format: Option<String>) -> Self {
        Self {
            data,
            format,
            width: None,
            height: None,
        }
    }

    /// Create an image with a known format tag.
    pub fn with_format(data: Vec<u8>, format: impl Into<String>) -> Self {
        Self::new(data, Some(format.into()))
    }

    /// Set image dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Size of the encoded data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// File extension for this image, falling back to `default` when the
    /// format tag is missing or sanitises to nothing.
    pub fn extension(&self, default: &str) -> String {
        self.format
            .as_deref()
            .map(sanitize_format)
            .filter(|ext| !ext.is_empty())
            .unwrap_or_else(|| {
                let fallback = sanitize_format(default);
                if fallback.is_empty() {
                    DEFAULT_FORMAT.to_string()
                } else {
                    fallback
                }
            })
    }
}

/// Reduce a format tag to lowercase ASCII alphanumerics.
pub fn sanitize_format(tag: &str) -> String {
    tag.trim()
        .trim_start_matches('.')
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xref_display_and_conversion() {
        let xref = Xref::from((42, 1));
        assert_eq!(xref.to_string(), "42 1 R");
        let id: (u32, u16) = xref.into();
        assert_eq!(id, (42, 1));
    }

    #[test]
    fn test_extension_defaults() {
        let img = ExtractedImage::new(vec![1, 2, 3], None);
        assert_eq!(img.extension(DEFAULT_FORMAT), "png");
        assert_eq!(img.extension("tiff"), "tiff");
        assert_eq!(img.extension(""), "png");
        assert_eq!(img.size(), 3);
    }

    #[test]
    fn test_extension_sanitized() {
        let img = ExtractedImage::with_format(vec![], "../JPEG");
        assert_eq!(img.extension(DEFAULT_FORMAT), "jpeg");

        let img = ExtractedImage::with_format(vec![], "///");
        assert_eq!(img.extension(DEFAULT_FORMAT), "png");
    }

    #[test]
    fn test_image_ref_builder() {
        let r = ImageRef::new((7, 0), "Im1").with_dimensions(640, 480);
        assert_eq!(r.xref, Xref::new(7, 0));
        assert_eq!(r.width, Some(640));
        assert_eq!(r.height, Some(480));
    }
}
