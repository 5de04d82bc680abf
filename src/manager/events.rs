use crate::capture::{CaptureFileType, LoadFailureReason};
use std::path::PathBuf;

/// Notifications emitted by [`super::CaptureManager`] for the UI layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// A load failed. Always followed by `FileLoaded(CaptureFileType::Unknown)`.
    LoadFailed {
        reason: LoadFailureReason,
        path: PathBuf,
        /// E.g. the expected asset path for a missing companion asset
        detail: Option<String>,
    },
    /// A load finished; `Unknown` after a failure
    FileLoaded(CaptureFileType),
    /// Fresh statistics are available through `capture_stats()`
    StatsUpdated,
}
