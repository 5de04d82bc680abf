//! Configuration management for capflow
//!
//! Typed settings are layered by [`CapflowConfig`] (embedded defaults, user
//! file, repository file, environment) and extracted into [`AppConfig`].

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod core;

pub use core::CapflowConfig;

/// Main configuration structure for capflow
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// External command execution
    pub process: ProcessConfig,

    /// Capture file naming rules
    pub capture: CaptureConfig,

    /// Trace statistics gathering
    pub stats: StatsConfig,

    /// Terminal output
    pub output: OutputConfig,
}

/// External command execution settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProcessConfig {
    /// Sleep between non-blocking reads when no output is available
    pub poll_interval_ms: u64,
}

/// Naming rules used to classify capture files and find their companions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    /// Extension of replay-script (auxiliary) captures
    pub auxiliary_extension: String,

    /// Extensions of packet-trace (primary) captures
    pub primary_extensions: Vec<String>,

    /// Filename marker replaced to derive the asset file name
    pub trigger_marker: String,

    /// Replacement for `trigger_marker`
    pub asset_marker: String,

    /// Extension of the companion asset file
    pub asset_extension: String,

    /// Extension of the packet trace produced by replaying an auxiliary capture
    pub replay_extension: String,
}

/// Trace statistics settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatsConfig {
    /// Events processed between cancellation checks
    pub cancel_poll_stride: usize,
}

/// Terminal output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Use colors when the terminal supports them
    pub color: bool,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

impl ProcessConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            auxiliary_extension: "gfxr".to_string(),
            primary_extensions: vec!["rd".to_string(), "dive".to_string()],
            trigger_marker: "_trim_trigger".to_string(),
            asset_marker: "_asset_file".to_string(),
            asset_extension: "gfxa".to_string(),
            replay_extension: "rd".to_string(),
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            cancel_poll_stride: 1024,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

impl AppConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.process.poll_interval_ms == 0 {
            anyhow::bail!("process.poll_interval_ms cannot be 0");
        }

        if self.stats.cancel_poll_stride == 0 {
            anyhow::bail!("stats.cancel_poll_stride cannot be 0");
        }

        let capture = &self.capture;
        if capture.auxiliary_extension.is_empty() || capture.asset_extension.is_empty() {
            anyhow::bail!("capture extensions cannot be empty");
        }
        if capture.primary_extensions.is_empty() {
            anyhow::bail!("At least one primary capture extension must be specified");
        }
        if capture.trigger_marker.is_empty() {
            anyhow::bail!("capture.trigger_marker cannot be empty");
        }
        for ext in std::iter::once(&capture.auxiliary_extension)
            .chain(&capture.primary_extensions)
            .chain([&capture.asset_extension, &capture.replay_extension])
        {
            if ext.starts_with('.') {
                anyhow::bail!("Extension '{}' must be given without the leading dot", ext);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
