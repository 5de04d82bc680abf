//! Capture file classification
//!
//! The type of a capture is decided from its extension plus the presence of
//! companion files next to it. Nothing is cached: every call looks at the
//! filesystem as it is right now.

use crate::config::CaptureConfig;
use crate::utils::has_extension;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Kind of capture found at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureFileType {
    Unknown,
    /// Auxiliary capture with its replayed packet trace next to it
    Combined,
    PrimaryOnly,
    AuxiliaryOnly,
}

impl fmt::Display for CaptureFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureFileType::Unknown => "unknown",
            CaptureFileType::Combined => "combined",
            CaptureFileType::PrimaryOnly => "primary only",
            CaptureFileType::AuxiliaryOnly => "auxiliary only",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error(
        "asset file {} required by {} is missing",
        expected_asset.display(),
        capture.display()
    )]
    MissingCompanionAsset {
        capture: PathBuf,
        expected_asset: PathBuf,
    },
}

/// A classified capture and the companion files it resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFiles {
    file_type: CaptureFileType,
    capture: PathBuf,
    asset: Option<PathBuf>,
    replay: Option<PathBuf>,
}

impl CaptureFiles {
    pub fn file_type(&self) -> CaptureFileType {
        self.file_type
    }

    /// The path that was classified
    pub fn capture_path(&self) -> &Path {
        &self.capture
    }

    /// The companion asset file, distinct from the capture path.
    /// Only auxiliary and combined captures have one.
    pub fn asset_path(&self) -> Option<&Path> {
        self.asset.as_deref()
    }

    /// Packet trace replayed from an auxiliary capture, for combined captures
    pub fn replay_path(&self) -> Option<&Path> {
        self.replay.as_deref()
    }

    /// Every file a loader needs, capture first
    pub fn all_paths(&self) -> Vec<&Path> {
        std::iter::once(self.capture.as_path())
            .chain(self.asset.as_deref())
            .chain(self.replay.as_deref())
            .collect()
    }
}

/// Classifies capture paths using configurable naming rules
#[derive(Debug, Clone, Default)]
pub struct FileClassifier {
    naming: CaptureConfig,
}

impl FileClassifier {
    pub fn new(naming: CaptureConfig) -> Self {
        Self { naming }
    }

    /// Classify `path`.
    ///
    /// An auxiliary capture whose asset file is missing fails with
    /// [`ClassifyError::MissingCompanionAsset`] instead of degrading to
    /// `Unknown`, so the caller can tell the user which file to look for.
    pub fn classify(&self, path: &Path) -> Result<CaptureFiles, ClassifyError> {
        let is_auxiliary = has_extension(path, &self.naming.auxiliary_extension);
        let mut has_primary = self
            .naming
            .primary_extensions
            .iter()
            .any(|ext| has_extension(path, ext));

        let mut asset = None;
        let mut replay = None;

        if is_auxiliary {
            let expected_asset = self.expected_asset_path(path);
            if !expected_asset.exists() {
                return Err(ClassifyError::MissingCompanionAsset {
                    capture: path.to_path_buf(),
                    expected_asset,
                });
            }
            asset = Some(expected_asset);

            let replay_path = self.replay_path(path);
            if replay_path.exists() {
                has_primary = true;
                replay = Some(replay_path);
            }
        }

        let file_type = match (is_auxiliary, has_primary) {
            (true, true) => CaptureFileType::Combined,
            (true, false) => CaptureFileType::AuxiliaryOnly,
            (false, true) => CaptureFileType::PrimaryOnly,
            (false, false) => CaptureFileType::Unknown,
        };

        Ok(CaptureFiles {
            file_type,
            capture: path.to_path_buf(),
            asset,
            replay,
        })
    }

    /// Asset file expected next to an auxiliary capture.
    ///
    /// The last occurrence of the trigger marker in the file name is replaced
    /// by the asset marker, then the extension is swapped. A name without the
    /// marker only gets its extension swapped.
    pub fn expected_asset_path(&self, capture: &Path) -> PathBuf {
        let Some(file_name) = capture.file_name() else {
            return capture.with_extension(&self.naming.asset_extension);
        };

        let mut name = file_name.to_string_lossy().into_owned();
        if let Some(pos) = name.rfind(&self.naming.trigger_marker) {
            name.replace_range(
                pos..pos + self.naming.trigger_marker.len(),
                &self.naming.asset_marker,
            );
        }

        capture
            .with_file_name(name)
            .with_extension(&self.naming.asset_extension)
    }

    /// Same-stem packet trace that marks an auxiliary capture as combined
    pub fn replay_path(&self, capture: &Path) -> PathBuf {
        capture.with_extension(&self.naming.replay_extension)
    }
}

/// Classify with the default naming rules
pub fn classify(path: &Path) -> Result<CaptureFiles, ClassifyError> {
    FileClassifier::default().classify(path)
}
