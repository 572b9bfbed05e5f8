//! Error types for pdfpix library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::model::Xref;

/// Result type alias for pdfpix operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting images.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input document is missing, unreadable, or cannot be loaded.
    #[error("Cannot open document '{input}': {reason}")]
    DocumentOpen {
        /// Path (or `<memory>`) of the input that failed to open
        input: String,
        /// What went wrong
        reason: String,
    },

    /// An embedded image could not be resolved to encoded bytes.
    #[error("Cannot resolve image {xref}: {reason}")]
    ImageResolution {
        /// Cross-reference identifier of the image stream
        xref: Xref,
        /// What went wrong
        reason: String,
    },

    /// The output directory or an output file could not be written.
    #[error("Cannot write '{}': {source}", .path.display())]
    Write {
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an [`Error::ImageResolution`] for the given image.
    pub fn resolution(xref: Xref, reason: impl Into<String>) -> Self {
        Error::ImageResolution {
            xref,
            reason: reason.into(),
        }
    }

    /// Build an [`Error::Write`] for the given path.
    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from opening the input document.
    pub fn is_document_open(&self) -> bool {
        matches!(self, Error::DocumentOpen { .. })
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::PdfParse(err.to_string()),
        }
    }
}
