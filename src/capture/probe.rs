//! Filesystem-backed capture data
//!
//! [`FileProbe`] satisfies the parser contract without decoding packets: it
//! checks that every component file can be opened and is not empty, and
//! records sizes for statistics. It is what the `capflow` binary loads into.

use super::classify::CaptureFiles;
use super::data::{CaptureData, CaptureMetadata, LoadResult, TraceEvent};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default)]
pub struct FileProbe {
    components: Vec<(PathBuf, u64)>,
    parsed: bool,
}

impl FileProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loaded component files with their sizes
    pub fn components(&self) -> &[(PathBuf, u64)] {
        &self.components
    }

    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    fn load_paths<'a>(&mut self, paths: impl IntoIterator<Item = &'a Path>) -> LoadResult {
        self.components.clear();
        self.parsed = false;

        for path in paths {
            match probe(path) {
                Ok(size) => self.components.push((path.to_path_buf(), size)),
                Err(result) => {
                    self.components.clear();
                    return result;
                }
            }
        }
        LoadResult::Success
    }

    fn parse(&mut self) -> bool {
        self.parsed = !self.components.is_empty();
        self.parsed
    }
}

fn probe(path: &Path) -> Result<u64, LoadResult> {
    let file = File::open(path).map_err(|e| {
        debug!("Cannot open {}: {}", path.display(), e);
        LoadResult::FileIoError
    })?;
    let size = file
        .metadata()
        .map_err(|_| LoadResult::FileIoError)?
        .len();

    if size == 0 {
        return Err(LoadResult::CorruptData);
    }
    Ok(size)
}

impl CaptureData for FileProbe {
    fn load_combined(&mut self, files: &CaptureFiles) -> LoadResult {
        self.load_paths(files.all_paths())
    }

    fn parse_combined(&mut self) -> bool {
        self.parse()
    }

    fn load_primary(&mut self, files: &CaptureFiles) -> LoadResult {
        self.load_paths([files.capture_path()])
    }

    fn parse_primary(&mut self) -> bool {
        self.parse()
    }

    fn load_auxiliary(&mut self, files: &CaptureFiles) -> LoadResult {
        self.load_paths(files.all_paths())
    }

    fn parse_auxiliary(&mut self) -> bool {
        self.parse()
    }

    fn events(&self) -> &[TraceEvent] {
        &[]
    }

    fn metadata(&self) -> CaptureMetadata {
        CaptureMetadata {
            components: self.components.len(),
            capture_bytes: self.components.iter().map(|(_, size)| size).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::classify;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_primary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame.rd");
        fs::write(&path, [1u8; 64]).unwrap();

        let files = classify(&path).unwrap();
        let mut probe = FileProbe::new();
        assert_eq!(probe.load_primary(&files), LoadResult::Success);
        assert!(probe.parse_primary());
        assert_eq!(
            probe.metadata(),
            CaptureMetadata {
                components: 1,
                capture_bytes: 64
            }
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let files = classify(&dir.path().join("absent.rd")).unwrap();

        let mut probe = FileProbe::new();
        assert_eq!(probe.load_primary(&files), LoadResult::FileIoError);
        assert!(!probe.parse_primary());
    }

    #[test]
    fn test_empty_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.dive");
        fs::write(&path, b"").unwrap();

        let files = classify(&path).unwrap();
        let mut probe = FileProbe::new();
        assert_eq!(probe.load_primary(&files), LoadResult::CorruptData);
    }

    #[test]
    fn test_load_combined_reads_all_components() {
        let dir = TempDir::new().unwrap();
        let capture = dir.path().join("t_trim_trigger.gfxr");
        fs::write(&capture, [0u8; 10]).unwrap();
        fs::write(dir.path().join("t_asset_file.gfxa"), [0u8; 20]).unwrap();
        fs::write(dir.path().join("t_trim_trigger.rd"), [0u8; 30]).unwrap();

        let files = classify(&capture).unwrap();
        let mut probe = FileProbe::new();
        assert_eq!(probe.load_combined(&files), LoadResult::Success);
        assert!(probe.parse_combined());
        assert_eq!(probe.components().len(), 3);
        assert_eq!(probe.metadata().capture_bytes, 60);
    }

    #[test]
    fn test_failed_load_clears_previous_capture() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.rd");
        fs::write(&good, [0u8; 8]).unwrap();

        let mut probe = FileProbe::new();
        probe.load_primary(&classify(&good).unwrap());
        probe.parse_primary();

        let missing = classify(&dir.path().join("missing.rd")).unwrap();
        assert_eq!(probe.load_primary(&missing), LoadResult::FileIoError);
        assert!(probe.components().is_empty());
        assert!(!probe.is_parsed());
    }
}
