//! Visitor pattern for observing and filtering an extraction run.
//!
//! The extractor calls back into an [`ExtractionVisitor`] as it walks the
//! document. Callbacks that return a [`VisitorAction`] can skip a page or a
//! single image; everything else is purely observational, which keeps
//! progress output out of the extraction loop itself.
//!
//! # Example
//!
//! ```
//! use pdfpix::extract::{ExtractionVisitor, VisitorAction};
//! use pdfpix::PlannedImage;
//!
//! /// Only keep the first image of every page.
//! struct FirstImageOnly;
//!
//! impl ExtractionVisitor for FirstImageOnly {
//!     fn visit_image(&mut self, image: &PlannedImage) -> VisitorAction {
//!         if image.position == 1 {
//!             VisitorAction::Continue
//!         } else {
//!             VisitorAction::Skip
//!         }
//!     }
//! }
//! ```

use std::path::Path;

use crate::error::Error;
use crate::model::{ExtractReport, PlannedImage, SavedImage, SkippedImage};

/// Action returned by visitor methods to control extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitorAction {
    /// Continue with default processing.
    #[default]
    Continue,

    /// Leave this element out (no resolution, no file).
    Skip,
}

impl VisitorAction {
    /// Check if this action indicates the element should be skipped.
    pub fn should_skip(&self) -> bool {
        matches!(self, VisitorAction::Skip)
    }
}

/// Callbacks invoked during an extraction run.
///
/// All methods do nothing (or return `VisitorAction::Continue`) by default.
pub trait ExtractionVisitor {
    /// Called once before the first page.
    fn visit_document(&mut self, input: &Path, page_count: u32) {
        let _ = (input, page_count);
    }

    /// Called for each selected page that has at least one image.
    fn visit_page(&mut self, page: u32, image_count: usize) -> VisitorAction {
        let _ = (page, image_count);
        VisitorAction::Continue
    }

    /// Called before an image is resolved.
    fn visit_image(&mut self, image: &PlannedImage) -> VisitorAction {
        let _ = image;
        VisitorAction::Continue
    }

    /// Called after an image has been written.
    fn image_saved(&mut self, saved: &SavedImage) {
        let _ = saved;
    }

    /// Called when an image is skipped because it could not be resolved.
    fn image_skipped(&mut self, skipped: &SkippedImage, error: &Error) {
        let _ = (skipped, error);
    }

    /// Called once after the last page.
    fn finish(&mut self, report: &ExtractReport) {
        let _ = report;
    }
}

/// Visitor that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVisitor;

impl DefaultVisitor {
    /// Create a new default visitor.
    pub fn new() -> Self {
        Self
    }
}

impl ExtractionVisitor for DefaultVisitor {}

/// Reports progress through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingVisitor;

impl ExtractionVisitor for LoggingVisitor {
    fn visit_document(&mut self, input: &Path, page_count: u32) {
        log::info!("Opening {} ({} pages)", input.display(), page_count);
    }

    fn visit_page(&mut self, page: u32, image_count: usize) -> VisitorAction {
        log::info!("Page {} has {} images", page, image_count);
        VisitorAction::Continue
    }

    fn image_saved(&mut self, saved: &SavedImage) {
        log::info!("Saved {}", saved.path.display());
    }

    fn image_skipped(&mut self, skipped: &SkippedImage, error: &Error) {
        log::warn!(
            "Skipped image {} on page {}: {}",
            skipped.position,
            skipped.page,
            error
        );
    }

    fn finish(&mut self, report: &ExtractReport) {
        log::info!("Extracted {} images", report.count());
    }
}

/// Runs several visitors in order; the first `Skip` wins.
#[derive(Default)]
pub struct CompositeVisitor<'a> {
    visitors: Vec<&'a mut dyn ExtractionVisitor>,
}

impl<'a> CompositeVisitor<'a> {
    /// Create an empty composite.
    pub fn new() -> Self {
        Self {
            visitors: Vec::new(),
        }
    }

    /// Add a visitor.
    pub fn with(mut self, visitor: &'a mut dyn ExtractionVisitor) -> Self {
        self.visitors.push(visitor);
        self
    }
}

impl ExtractionVisitor for CompositeVisitor<'_> {
    fn visit_document(&mut self, input: &Path, page_count: u32) {
        for v in &mut self.visitors {
            v.visit_document(input, page_count);
        }
    }

    fn visit_page(&mut self, page: u32, image_count: usize) -> VisitorAction {
        for v in &mut self.visitors {
            if v.visit_page(page, image_count).should_skip() {
                return VisitorAction::Skip;
            }
        }
        VisitorAction::Continue
    }

    fn visit_image(&mut self, image: &PlannedImage) -> VisitorAction {
        for v in &mut self.visitors {
            if v.visit_image(image).should_skip() {
                return VisitorAction::Skip;
            }
        }
        VisitorAction::Continue
    }

    fn image_saved(&mut self, saved: &SavedImage) {
        for v in &mut self.visitors {
            v.image_saved(saved);
        }
    }

    fn image_skipped(&mut self, skipped: &SkippedImage, error: &Error) {
        for v in &mut self.visitors {
            v.image_skipped(skipped, error);
        }
    }

    fn finish(&mut self, report: &ExtractReport) {
        for v in &mut self.visitors {
            v.finish(report);
        }
    }
}
