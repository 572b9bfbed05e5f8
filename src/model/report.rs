//! Summary of an extraction run.

use std::path::PathBuf;

use serde::Serialize;

use super::image::{ImageRef, Xref};
use crate::error::{Error, Result};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// An image that was written by the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedImage {
    /// 1-based page number
    pub page: u32,
    /// 1-based position of the image on its page
    pub position: u32,
    /// Cross-reference identifier of the image stream
    pub xref: Xref,
    /// Generated file name (`page<N>_img<M>.<ext>`)
    pub file_name: String,
    /// Where the sink stored the bytes
    pub path: PathBuf,
    /// Format tag used as the extension
    pub format: String,
    /// Number of bytes written
    pub size: usize,
    /// Width in pixels (if known)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Height in pixels (if known)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// An image left out because it could not be resolved (lenient mode only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedImage {
    /// 1-based page number
    pub page: u32,
    /// 1-based position of the image on its page
    pub position: u32,
    /// Cross-reference identifier of the image stream
    pub xref: Xref,
    /// Error message
    pub reason: String,
}

/// An image found during enumeration, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedImage {
    /// 1-based page number
    pub page: u32,
    /// 1-based position of the image on its page
    pub position: u32,
    /// The descriptor reported by the backend
    pub image: ImageRef,
}

/// Result of an extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractReport {
    /// Total pages in the document
    pub page_count: u32,
    /// Pages whose image list was enumerated
    pub pages_scanned: u32,
    /// Images written, in extraction order
    pub saved: Vec<SavedImage>,
    /// Images skipped in lenient mode
    pub skipped: Vec<SkippedImage>,
}

impl ExtractReport {
    /// Create an empty report for a document with `page_count` pages.
    pub fn new(page_count: u32) -> Self {
        Self {
            page_count,
            ..Default::default()
        }
    }

    /// Number of images written.
    pub fn count(&self) -> usize {
        self.saved.len()
    }

    /// Total bytes written.
    pub fn total_bytes(&self) -> usize {
        self.saved.iter().map(|s| s.size).sum()
    }

    /// Whether every enumerated image was written.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Serialize the report.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        let result = match format {
            JsonFormat::Pretty => serde_json::to_string_pretty(self),
            JsonFormat::Compact => serde_json::to_string(self),
        };

        result.map_err(|e| Error::Other(format!("JSON serialization error: {}", e)))
    }
}
