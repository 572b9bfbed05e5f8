//! Destinations for extracted image bytes.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Receives encoded image bytes under their generated file name.
pub trait ImageSink {
    /// Store `data` as `file_name`, replacing any previous content, and
    /// return where it was stored.
    fn write(&mut self, file_name: &str, data: &[u8]) -> Result<PathBuf>;
}

/// Writes images into a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Create the directory (and missing parents) if needed.
    ///
    /// An existing directory is reused as is; files already in it are left
    /// alone unless a generated name overwrites them.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| Error::write(&dir, e))?;
        Ok(Self { dir })
    }
}

impl ImageSink for DirectorySink {
    fn write(&mut self, file_name: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.dir.join(file_name);
        fs::write(&path, data).map_err(|e| Error::write(&path, e))?;
        Ok(path)
    }
}

/// Keeps images in memory, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Stored files
    pub files: BTreeMap<String, Vec<u8>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes stored under `file_name`.
    pub fn get(&self, file_name: &str) -> Option<&[u8]> {
        self.files.get(file_name).map(Vec::as_slice)
    }

    /// Stored file names in sorted order.
    pub fn file_names(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }
}

impl ImageSink for MemorySink {
    fn write(&mut self, file_name: &str, data: &[u8]) -> Result<PathBuf> {
        self.files.insert(file_name.to_string(), data.to_vec());
        Ok(PathBuf::from(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_sink_creates_nested_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("a").join("b");

        let mut sink = DirectorySink::create(&target).unwrap();
        let path = sink.write("page1_img1.png", b"abc").unwrap();

        assert_eq!(path, target.join("page1_img1.png"));
        assert_eq!(fs::read(&path).unwrap(), b"abc");

        // Second create on the same directory is fine
        DirectorySink::create(&target).unwrap();
    }

    #[test]
    fn test_directory_sink_truncates() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::create(tmp.path()).unwrap();
        sink.write("x.png", b"longer content").unwrap();
        let path = sink.write("x.png", b"short").unwrap();
        assert_eq!(fs::read(path).unwrap(), b"short");
    }

    #[test]
    fn test_directory_sink_blocked_by_file() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, b"").unwrap();

        let err = DirectorySink::create(blocker.join("out")).unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::new();
        sink.write("page2_img1.png", &[1, 2]).unwrap();
        sink.write("page1_img1.jpeg", &[3]).unwrap();

        assert_eq!(sink.get("page2_img1.png"), Some(&[1u8, 2][..]));
        assert_eq!(sink.file_names(), vec!["page1_img1.jpeg", "page2_img1.png"]);
        assert!(sink.get("missing").is_none());
    }
}
