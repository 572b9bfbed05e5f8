//! # pdfpix
//!
//! Extract embedded raster images from PDF documents.
//!
//! Every image XObject referenced by a page is written to an output
//! directory as `page<N>_img<M>.<ext>`, where `N` is the 1-based page number,
//! `M` the 1-based position of the image on that page, and `ext` the native
//! encoding of the bytes (`jpeg`, `jpx`, `jb2`, or `png` for raw samples).
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> pdfpix::Result<()> {
//!     let report = pdfpix::extract_images("brochure.pdf", "brochure_images")?;
//!     println!("Extracted {} images", report.count());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Byte-exact output**: JPEG, JPEG 2000 and JBIG2 streams are written as stored
//! - **Raw samples to PNG**: gray, RGB, CMYK, indexed and stencil images
//! - **Pluggable backend**: the extraction loop runs against any [`PdfBackend`]
//! - **Error policy**: abort on the first broken image or skip it ([`ErrorMode`])
//! - **Page selection**: restrict extraction to `1-3,7` style page lists

pub mod backend;
pub mod detect;
pub mod error;
pub mod extract;
pub mod model;

// Re-export commonly used types
pub use backend::{LopdfBackend, PdfBackend};
pub use detect::{detect_format_from_bytes, detect_format_from_path, PdfFormat};
pub use error::{Error, Result};
pub use extract::{
    image_file_name, DirectorySink, ErrorMode, ExtractOptions, ExtractionVisitor, ImageExtractor,
    ImageSink, MemorySink, PageSelection, VisitorAction,
};
pub use model::{
    ExtractReport, ExtractedImage, ImageRef, JsonFormat, PlannedImage, SavedImage, SkippedImage,
    Xref,
};

use std::path::{Path, PathBuf};

/// Extract all images of a PDF file into a directory.
///
/// The document is opened first; the directory is only created once the
/// document has loaded, so a bad input leaves the file system untouched.
///
/// # Example
///
/// ```no_run
/// let report = pdfpix::extract_images("brochure.pdf", "out").unwrap();
/// for saved in &report.saved {
///     println!("{}", saved.path.display());
/// }
/// ```
pub fn extract_images<P, Q>(input: P, output_dir: Q) -> Result<ExtractReport>
where
    P: Into<PathBuf>,
    Q: Into<PathBuf>,
{
    let options = ExtractOptions::new()
        .with_input(input)
        .with_output_dir(output_dir);
    extract_images_with_options(options)
}

/// Extract images with custom options.
///
/// # Example
///
/// ```no_run
/// use pdfpix::{extract_images_with_options, ExtractOptions, PageSelection};
///
/// let options = ExtractOptions::new()
///     .with_input("brochure.pdf")
///     .with_output_dir("out")
///     .with_pages(PageSelection::Range(1..=4))
///     .lenient();
/// let report = extract_images_with_options(options).unwrap();
/// println!("{} written, {} skipped", report.count(), report.skipped.len());
/// ```
pub fn extract_images_with_options(options: ExtractOptions) -> Result<ExtractReport> {
    ImageExtractor::open(options)?.run()
}

/// Extract images from an in-memory PDF into a [`MemorySink`].
pub fn extract_images_from_bytes(
    data: &[u8],
    options: ExtractOptions,
) -> Result<(ExtractReport, MemorySink)> {
    let extractor = ImageExtractor::with_backend(LopdfBackend::load_bytes(data)?, options);
    let mut sink = MemorySink::new();
    let report = extractor.extract_to(&mut sink, &mut extract::DefaultVisitor)?;
    Ok((report, sink))
}

/// List the images of a PDF file without extracting them.
///
/// # Example
///
/// ```no_run
/// for item in pdfpix::list_images("brochure.pdf").unwrap() {
///     println!("page {} #{}: {}", item.page, item.position, item.image.xref);
/// }
/// ```
pub fn list_images<P: AsRef<Path>>(path: P) -> Result<Vec<PlannedImage>> {
    let options = ExtractOptions::new().with_input(path.as_ref());
    ImageExtractor::open(options)?.plan()
}
