//! PDF backend abstraction layer.
//!
//! Provides a narrow trait-based interface for the three capabilities image
//! extraction needs, isolating the concrete PDF library (lopdf) from the
//! extraction loop so that tests can drive the loop with a mock document.

mod lopdf_backend;
mod pixels;

pub use lopdf_backend::LopdfBackend;

use crate::error::Result;
use crate::model::{ExtractedImage, ImageRef};

/// Abstract interface for PDF document access.
pub trait PdfBackend {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// List the images used on the page at `page_index` (zero-based), in the
    /// order the document declares them.
    fn page_images(&self, page_index: u32) -> Result<Vec<ImageRef>>;

    /// Resolve a descriptor to encoded bytes and a format tag.
    fn resolve_image(&self, image: &ImageRef) -> Result<ExtractedImage>;
}

impl<B: PdfBackend + ?Sized> PdfBackend for Box<B> {
    fn page_count(&self) -> u32 {
        (**self).page_count()
    }

    fn page_images(&self, page_index: u32) -> Result<Vec<ImageRef>> {
        (**self).page_images(page_index)
    }

    fn resolve_image(&self, image: &ImageRef) -> Result<ExtractedImage> {
        (**self).resolve_image(image)
    }
}
