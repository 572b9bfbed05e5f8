//! Data types shared by backends, the extractor, and callers.
//!
//! Descriptors ([`ImageRef`]) and payloads ([`ExtractedImage`]) live only for
//! a single loop iteration; [`ExtractReport`] is what survives a run.

mod image;
mod report;

pub use image::{sanitize_format, ExtractedImage, ImageRef, Xref, DEFAULT_FORMAT};
pub use report::{ExtractReport, JsonFormat, PlannedImage, SavedImage, SkippedImage};
