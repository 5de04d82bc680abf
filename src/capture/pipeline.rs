//! Load and statistics dispatch
//!
//! Both entry points take the shared capture data behind an `RwLock`. A load
//! classifies first and only then takes the write lock, so unsupported files
//! never touch the shared state. Guards are scoped to the function body and
//! released on every return path.

use super::classify::{CaptureFileType, CaptureFiles, ClassifyError, FileClassifier};
use super::data::{CaptureData, LoadResult};
use super::error::{LoadFailure, LoadFailureReason};
use super::stats::{CaptureStats, TraceStats};
use crate::cancel::CancellationContext;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

type LoadStep<D> = fn(&mut D, &CaptureFiles) -> LoadResult;
type ParseStep<D> = fn(&mut D) -> bool;

/// Classify `path` and run the matching load + parse steps under the write lock
pub fn load<D: CaptureData>(
    context: &CancellationContext,
    classifier: &FileClassifier,
    path: &Path,
    data: &RwLock<D>,
) -> Result<CaptureFileType, LoadFailure> {
    let files = classifier.classify(path).map_err(|e| match e {
        ClassifyError::MissingCompanionAsset { expected_asset, .. } => {
            LoadFailure::new(LoadFailureReason::MissingCompanionAsset, path)
                .with_detail(expected_asset.display().to_string())
        }
    })?;

    let file_type = files.file_type();
    let (load_step, parse_step): (LoadStep<D>, ParseStep<D>) = match file_type {
        CaptureFileType::Combined => (D::load_combined, D::parse_combined),
        CaptureFileType::PrimaryOnly => (D::load_primary, D::parse_primary),
        CaptureFileType::AuxiliaryOnly => (D::load_auxiliary, D::parse_auxiliary),
        CaptureFileType::Unknown => {
            return Err(LoadFailure::new(LoadFailureReason::UnsupportedFile, path));
        }
    };

    if context.is_cancelled() {
        return Err(LoadFailure::new(LoadFailureReason::Cancelled, path));
    }

    let mut guard = write_lock(data);
    debug!("Loading {} capture {}", file_type, path.display());
    let load_result = load_step(&mut *guard, &files);
    let parsed = load_result == LoadResult::Success && parse_step(&mut *guard);
    drop(guard);

    if load_result != LoadResult::Success {
        info!("Load of {} failed: {:?}", path.display(), load_result);
        return Err(LoadFailure::new(load_result.into(), path));
    }
    if !parsed {
        info!("Parse of {} failed", path.display());
        return Err(LoadFailure::new(LoadFailureReason::ParseFailure, path));
    }

    Ok(file_type)
}

/// Compute statistics under the read lock. `None` means cancelled.
pub fn gather_stats<D: CaptureData>(
    context: &CancellationContext,
    trace_stats: &TraceStats,
    data: &RwLock<D>,
) -> Option<CaptureStats> {
    let guard = read_lock(data);
    trace_stats.gather(context, guard.metadata(), guard.events())
}

/// Exclusive access; a poisoned lock is recovered because the next load
/// replaces whatever a panicked job left behind
pub(crate) fn write_lock<D>(data: &RwLock<D>) -> RwLockWriteGuard<'_, D> {
    data.write().unwrap_or_else(|poisoned| {
        warn!("Capture data lock was poisoned by a panicked job; recovering");
        PoisonError::into_inner(poisoned)
    })
}

pub(crate) fn read_lock<D>(data: &RwLock<D>) -> RwLockReadGuard<'_, D> {
    data.read().unwrap_or_else(|poisoned| {
        warn!("Capture data lock was poisoned by a panicked job; recovering");
        PoisonError::into_inner(poisoned)
    })
}
