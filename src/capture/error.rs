use super::data::LoadResult;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Why a capture failed to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadFailureReason {
    Unknown,
    FileIoError,
    CorruptData,
    VersionError,
    ParseFailure,
    UnsupportedFile,
    MissingCompanionAsset,
    /// Superseded before it started; never reported to the user
    Cancelled,
}

impl From<LoadResult> for LoadFailureReason {
    fn from(result: LoadResult) -> Self {
        match result {
            // Not a failure; only reachable through a caller bug
            LoadResult::Success => LoadFailureReason::Unknown,
            LoadResult::FileIoError => LoadFailureReason::FileIoError,
            LoadResult::CorruptData => LoadFailureReason::CorruptData,
            LoadResult::VersionError => LoadFailureReason::VersionError,
        }
    }
}

impl fmt::Display for LoadFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            LoadFailureReason::Unknown => "unknown error",
            LoadFailureReason::FileIoError => "file could not be read",
            LoadFailureReason::CorruptData => "capture data is corrupt",
            LoadFailureReason::VersionError => "unsupported capture version",
            LoadFailureReason::ParseFailure => "capture could not be parsed",
            LoadFailureReason::UnsupportedFile => "unsupported file type",
            LoadFailureReason::MissingCompanionAsset => "companion asset file is missing",
            LoadFailureReason::Cancelled => "cancelled",
        };
        f.write_str(message)
    }
}

/// A failed load, with enough context for the user to act on
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}: {}", path.display())]
pub struct LoadFailure {
    pub reason: LoadFailureReason,
    pub path: PathBuf,
    /// Extra context, e.g. the expected asset path
    pub detail: Option<String>,
}

impl LoadFailure {
    pub fn new(reason: LoadFailureReason, path: impl Into<PathBuf>) -> Self {
        Self {
            reason,
            path: path.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason == LoadFailureReason::Cancelled
    }
}
