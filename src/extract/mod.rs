//! The image extraction loop.
//!
//! [`ImageExtractor`] walks pages in ascending order and the images of each
//! page in the order the backend lists them. Where the bytes end up is the
//! [`ImageSink`]'s business, and progress reporting belongs to the
//! [`ExtractionVisitor`], so the loop can run against a mock backend and an
//! in-memory sink in tests.
//!
//! # Example
//!
//! ```no_run
//! use pdfpix::{ExtractOptions, ImageExtractor};
//!
//! let options = ExtractOptions::new()
//!     .with_input("brochure.pdf")
//!     .with_output_dir("brochure_images");
//! let report = ImageExtractor::open(options)?.run()?;
//! println!("Extracted {} images", report.count());
//! # Ok::<(), pdfpix::Error>(())
//! ```

mod naming;
mod options;
mod sink;
pub mod visitor;

pub use naming::image_file_name;
pub use options::{ErrorMode, ExtractOptions, PageSelection, DEFAULT_INPUT_PATH, DEFAULT_OUTPUT_DIR};
pub use sink::{DirectorySink, ImageSink, MemorySink};
pub use visitor::{
    CompositeVisitor, DefaultVisitor, ExtractionVisitor, LoggingVisitor, VisitorAction,
};

use crate::backend::{LopdfBackend, PdfBackend};
use crate::error::Result;
use crate::model::{ExtractReport, ImageRef, PlannedImage, SavedImage, SkippedImage};

/// Extracts every embedded image of one document.
///
/// The extractor owns its backend, so the document is released when the
/// extractor is dropped, whichever way the run ends.
pub struct ImageExtractor<B> {
    backend: B,
    options: ExtractOptions,
}

impl ImageExtractor<LopdfBackend> {
    /// Open `options.input_path` with the lopdf backend.
    pub fn open(options: ExtractOptions) -> Result<Self> {
        let backend = LopdfBackend::open(&options.input_path)?;
        Ok(Self::with_backend(backend, options))
    }
}

impl<B: PdfBackend> ImageExtractor<B> {
    /// Use an already opened backend.
    pub fn with_backend(backend: B, options: ExtractOptions) -> Self {
        Self { backend, options }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Extract into `options.output_dir`, logging progress.
    pub fn run(&self) -> Result<ExtractReport> {
        self.run_with_visitor(&mut LoggingVisitor)
    }

    /// Extract into `options.output_dir`, reporting progress to `visitor`.
    ///
    /// The directory is created (with parents) before the first page is
    /// scanned.
    pub fn run_with_visitor<V>(&self, visitor: &mut V) -> Result<ExtractReport>
    where
        V: ExtractionVisitor + ?Sized,
    {
        let mut sink = DirectorySink::create(&self.options.output_dir)?;
        self.extract_to(&mut sink, visitor)
    }

    /// List the images of the selected pages without resolving them.
    pub fn plan(&self) -> Result<Vec<PlannedImage>> {
        let mut planned = Vec::new();
        for page_index in self.selected_pages() {
            let images = match self.page_images(page_index) {
                Some(result) => result?,
                None => continue,
            };
            planned.extend(
                (1u32..)
                    .zip(images)
                    .map(|(position, image)| PlannedImage {
                        page: page_index + 1,
                        position,
                        image,
                    }),
            );
        }
        Ok(planned)
    }

    /// Resolve every image of the selected pages and hand it to `sink`.
    ///
    /// Unresolvable images abort the run in [`ErrorMode::Strict`] and are
    /// recorded as skipped in [`ErrorMode::Lenient`]. Sink failures always
    /// abort; files written before the failure stay where they are.
    pub fn extract_to<S, V>(&self, sink: &mut S, visitor: &mut V) -> Result<ExtractReport>
    where
        S: ImageSink + ?Sized,
        V: ExtractionVisitor + ?Sized,
    {
        let page_count = self.backend.page_count();
        let mut report = ExtractReport::new(page_count);
        visitor.visit_document(&self.options.input_path, page_count);

        for page_index in self.selected_pages() {
            let page = page_index + 1;
            let images = match self.page_images(page_index) {
                Some(result) => result?,
                None => continue,
            };
            report.pages_scanned += 1;

            if images.is_empty() || visitor.visit_page(page, images.len()).should_skip() {
                continue;
            }

            for (position, image) in (1u32..).zip(images) {
                let planned = PlannedImage {
                    page,
                    position,
                    image,
                };
                if visitor.visit_image(&planned).should_skip() {
                    continue;
                }

                let xref = planned.image.xref;
                let extracted = match self.backend.resolve_image(&planned.image) {
                    Ok(extracted) => extracted,
                    Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                        let skipped = SkippedImage {
                            page,
                            position,
                            xref,
                            reason: e.to_string(),
                        };
                        visitor.image_skipped(&skipped, &e);
                        report.skipped.push(skipped);
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                let format = extracted.extension(&self.options.default_format);
                let file_name = image_file_name(page, position, &format);
                let path = sink.write(&file_name, &extracted.data)?;

                let saved = SavedImage {
                    page,
                    position,
                    xref,
                    file_name,
                    path,
                    format,
                    size: extracted.size(),
                    width: extracted.width.or(planned.image.width),
                    height: extracted.height.or(planned.image.height),
                };
                visitor.image_saved(&saved);
                report.saved.push(saved);
            }
        }

        visitor.finish(&report);
        Ok(report)
    }

    fn selected_pages(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.backend.page_count()).filter(|index| self.options.pages.includes(index + 1))
    }

    /// Enumerate a page's images; `None` means the page was skipped after a
    /// lenient-mode failure.
    fn page_images(&self, page_index: u32) -> Option<Result<Vec<ImageRef>>> {
        match self.backend.page_images(page_index) {
            Ok(images) => Some(Ok(images)),
            Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                log::warn!("Skipping page {}: {}", page_index + 1, e);
                None
            }
            Err(e) => Some(Err(e)),
        }
    }
}
