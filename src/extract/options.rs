//! Extraction options and configuration.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::DEFAULT_FORMAT;

/// Input document used when none is configured.
pub const DEFAULT_INPUT_PATH: &str = "src/assets/brand/Brandbook V Medical Spa.pdf";

/// Output directory used when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "src/assets/brand/extracted";

/// Options for an extraction run.
///
/// Deserializable from JSON; missing fields take their defaults:
///
/// ```
/// use pdfpix::{ErrorMode, ExtractOptions};
///
/// let json = r#"{"input_path": "in.pdf", "error_mode": "lenient"}"#;
/// let options = ExtractOptions::from_json(json)?;
/// assert_eq!(options.error_mode, ErrorMode::Lenient);
/// # Ok::<(), pdfpix::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Source PDF
    pub input_path: PathBuf,

    /// Destination directory (created if missing)
    pub output_dir: PathBuf,

    /// What to do when a single image cannot be resolved
    pub error_mode: ErrorMode,

    /// Which pages to scan (1-indexed)
    pub pages: PageSelection,

    /// Extension used when the backend reports no format tag
    pub default_format: String,
}

impl ExtractOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the input document.
    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = path.into();
        self
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Skip unresolvable images instead of aborting.
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Set the fallback format tag.
    pub fn with_default_format(mut self, format: impl Into<String>) -> Self {
        self.default_format = format.into();
        self
    }

    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load options from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            error_mode: ErrorMode::Strict,
            pages: PageSelection::All,
            default_format: DEFAULT_FORMAT.to_string(),
        }
    }
}

/// Policy for images that cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Abort the run on the first failure
    #[default]
    Strict,
    /// Record the image as skipped and continue
    Lenient,
}

/// Page selection (1-indexed page numbers).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PageSelection {
    /// Every page
    #[default]
    All,
    /// A range of pages (inclusive)
    Range(RangeInclusive<u32>),
    /// Specific pages
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.binary_search(&page).is_ok(),
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        if !s.contains(',') {
            if let Some((start, end)) = s.split_once('-') {
                let (start, end) = (parse_page(start)?, parse_page(end)?);
                return if start <= end {
                    Ok(PageSelection::Range(start..=end))
                } else {
                    Err(Error::InvalidPageRange(format!("{} > {}", start, end)))
                };
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            match part.split_once('-') {
                Some((start, end)) => {
                    let (start, end) = (parse_page(start)?, parse_page(end)?);
                    if start > end {
                        return Err(Error::InvalidPageRange(format!("{} > {}", start, end)));
                    }
                    pages.extend(start..=end);
                }
                None => pages.push(parse_page(part)?),
            }
        }

        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}

fn parse_page(s: &str) -> Result<u32> {
    let s = s.trim();
    match s.parse::<u32>() {
        Ok(0) => Err(Error::InvalidPageRange(
            "page numbers start at 1".to_string(),
        )),
        Ok(page) => Ok(page),
        Err(_) => Err(Error::InvalidPageRange(format!("'{}' is not a page number", s))),
    }
}

impl std::fmt::Display for PageSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageSelection::All => write!(f, "all"),
            PageSelection::Range(range) => write!(f, "{}-{}", range.start(), range.end()),
            PageSelection::Pages(pages) => {
                let parts: Vec<String> = pages.iter().map(u32::to_string).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

impl std::str::FromStr for PageSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PageSelection {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<PageSelection> for String {
    fn from(selection: PageSelection) -> Self {
        selection.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_options_builder() {
        let options = ExtractOptions::new()
            .with_input("in.pdf")
            .with_output_dir("out")
            .lenient()
            .with_pages(PageSelection::Range(2..=4))
            .with_default_format("bin");

        assert_eq!(options.input_path, PathBuf::from("in.pdf"));
        assert_eq!(options.output_dir, PathBuf::from("out"));
        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert_eq!(options.pages, PageSelection::Range(2..=4));
        assert_eq!(options.default_format, "bin");
    }

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert_eq!(options.input_path, PathBuf::from(DEFAULT_INPUT_PATH));
        assert_eq!(options.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert_eq!(options.pages, PageSelection::All);
        assert_eq!(options.default_format, "png");
    }

    #[test]
    fn test_options_from_json() {
        let options = ExtractOptions::from_json(
            r#"{"output_dir": "imgs", "pages": "1,3-4", "error_mode": "lenient"}"#,
        )
        .unwrap();
        assert_eq!(options.input_path, PathBuf::from(DEFAULT_INPUT_PATH));
        assert_eq!(options.output_dir, PathBuf::from("imgs"));
        assert_eq!(options.pages, PageSelection::Pages(vec![1, 3, 4]));
        assert_eq!(options.error_mode, ErrorMode::Lenient);
    }

    #[test]
    fn test_options_from_json_invalid() {
        assert!(matches!(
            ExtractOptions::from_json(r#"{"pages": "0-2"}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ExtractOptions::from_json("not json"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_page_selection_includes() {
        let all = PageSelection::All;
        assert!(all.includes(1));
        assert!(all.includes(100));

        let range = PageSelection::Range(5..=10);
        assert!(!range.includes(4));
        assert!(range.includes(5));
        assert!(range.includes(10));
        assert!(!range.includes(11));

        let pages = PageSelection::Pages(vec![1, 3, 5, 7]);
        assert!(pages.includes(1));
        assert!(!pages.includes(2));
        assert!(pages.includes(7));
    }

    #[test]
    fn test_page_selection_parse() {
        assert_eq!(PageSelection::parse("all").unwrap(), PageSelection::All);
        assert_eq!(PageSelection::parse("  ").unwrap(), PageSelection::All);
        assert_eq!(
            PageSelection::parse("1-10").unwrap(),
            PageSelection::Range(1..=10)
        );
        assert_eq!(
            PageSelection::parse("7,1,3,5-7,10").unwrap(),
            PageSelection::Pages(vec![1, 3, 5, 6, 7, 10])
        );
    }

    #[test]
    fn test_page_selection_parse_errors() {
        assert!(PageSelection::parse("0").is_err());
        assert!(PageSelection::parse("5-2").is_err());
        assert!(PageSelection::parse("1,x").is_err());
        assert!(PageSelection::parse("1,4-2").is_err());
    }

    #[test]
    fn test_page_selection_display_round_trip() {
        let selection = PageSelection::parse("2,4-5").unwrap();
        assert_eq!(selection.to_string(), "2,4,5");
        assert_eq!(PageSelection::Range(3..=9).to_string(), "3-9");
    }
}
