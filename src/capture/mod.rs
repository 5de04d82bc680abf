//! Capture files and the shared capture data
//!
//! - [`mod@classify`]: decide the capture type and resolve companion files
//! - [`data`]: the contract the external parser fulfils
//! - [`pipeline`]: load and statistics jobs run against the shared data
//! - [`probe`]: filesystem-backed implementation of the contract
//! - [`stats`]: cancellable trace statistics

pub mod classify;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod probe;
pub mod stats;

pub use classify::{CaptureFileType, CaptureFiles, ClassifyError, FileClassifier, classify};
pub use data::{CaptureData, CaptureMetadata, LoadResult, TraceEvent};
pub use error::{LoadFailure, LoadFailureReason};
pub use probe::FileProbe;
pub use stats::{CaptureStats, TraceStats};
