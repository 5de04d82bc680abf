//! Contract with the capture parser
//!
//! The packet parser itself lives outside this crate. The dispatch pipeline
//! only needs a load step and a parse step per capture type, plus read
//! access to the parsed events for statistics.

use super::classify::CaptureFiles;
use serde::Serialize;

/// Outcome of a parser load step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadResult {
    Success,
    FileIoError,
    CorruptData,
    VersionError,
}

/// Trace event kinds counted by statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEvent {
    Draw,
    Dispatch,
    Clear,
    Copy,
    Barrier,
    Submit,
    Marker,
}

/// Size information about what is currently loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptureMetadata {
    /// Files that make up the loaded capture
    pub components: usize,
    pub capture_bytes: u64,
}

/// Shared capture-data object.
///
/// Load and parse steps are only called while the caller holds exclusive
/// access; `events` and `metadata` only under shared access.
pub trait CaptureData: Send + Sync + 'static {
    /// Load an auxiliary capture together with its replayed packet trace
    fn load_combined(&mut self, files: &CaptureFiles) -> LoadResult;
    fn parse_combined(&mut self) -> bool;

    fn load_primary(&mut self, files: &CaptureFiles) -> LoadResult;
    fn parse_primary(&mut self) -> bool;

    fn load_auxiliary(&mut self, files: &CaptureFiles) -> LoadResult;
    fn parse_auxiliary(&mut self) -> bool;

    /// Parsed events of the current capture, in submission order
    fn events(&self) -> &[TraceEvent];

    fn metadata(&self) -> CaptureMetadata {
        CaptureMetadata::default()
    }
}
