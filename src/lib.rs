//! # capflow - asynchronous capture loading for GPU trace tooling
//!
//! Loads GPU capture files on a background worker so the interactive thread
//! stays responsive, computes cancellable trace statistics, and runs
//! external commands that can be cancelled while they produce output.
//!
//! ## Pieces
//!
//! - [`manager::CaptureManager`]: one-job-at-a-time coordinator with
//!   coalescing of load requests and preemption of statistics
//! - [`capture`]: capture file classification, the capture-data contract and
//!   the load/stats pipeline
//! - [`external::CommandRunner`]: shell command runner observing a
//!   [`cancel::CancellationContext`]
//!
//! ## Quick Start
//!
//! ```bash
//! capflow classify frame_trim_trigger.gfxr
//! capflow load frame.rd --stats
//! capflow exec --timeout-ms 5000 -- adb shell ls /sdcard
//! ```

pub mod cancel;
pub mod capture;
pub mod cli;
pub mod config;
pub mod external;
pub mod manager;
pub mod utils;

pub use cancel::CancellationContext;
pub use cli::{Cli, Output};
pub use config::{AppConfig, CapflowConfig};
pub use manager::{CaptureEvent, CaptureManager, CoordinatorState};

/// Result type alias for capflow operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
