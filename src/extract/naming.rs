//! Output file naming.

use crate::model::sanitize_format;

/// Build the output file name for an image: `page<N>_img<M>.<ext>`.
///
/// `page` and `position` are both 1-based. The pair is unique per run, so
/// names never collide regardless of the extension.
pub fn image_file_name(page: u32, position: u32, extension: &str) -> String {
    format!("page{}_img{}.{}", page, position, sanitize_format(extension))
}
