use crate::capture::{CaptureFileType, CaptureStats, FileProbe};
use crate::cli::{Output, load_settings};
use crate::config::AppConfig;
use crate::manager::{CaptureEvent, CaptureManager};
use crate::utils::format_file_size;
use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use indicatif::ProgressBar;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args)]
pub struct LoadArgs {
    /// Captures to load; requests are issued back to back, so only the first
    /// and the last are actually loaded
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Gather trace statistics after the last load
    #[arg(long)]
    pub stats: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = LoadFormat::Text)]
    pub format: LoadFormat,

    /// Give up waiting for the worker after this many milliseconds
    #[arg(long, value_name = "MS", default_value_t = 60_000)]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LoadFormat {
    Text,
    Json,
}

/// Everything the coordinator reported for one invocation
struct LoadReport {
    events: Vec<CaptureEvent>,
    loaded: CaptureFileType,
    stats: Option<CaptureStats>,
}

pub async fn execute(args: LoadArgs, custom_config: Option<&str>, output: &Output) -> Result<()> {
    let settings = load_settings(custom_config, output)?;

    let spinner = if args.format == LoadFormat::Text {
        output.spinner("Loading captures")
    } else {
        ProgressBar::hidden()
    };

    let paths = args.paths.clone();
    let timeout = Duration::from_millis(args.timeout_ms);
    let gather = args.stats;
    let report = tokio::task::spawn_blocking({
        let spinner = spinner.clone();
        move || run_loads(&settings, paths, gather, timeout, &spinner)
    })
    .await
    .context("Load task failed")?;
    spinner.finish_and_clear();
    let report = report?;

    match args.format {
        LoadFormat::Text => print_text(&report, output),
        LoadFormat::Json => print_json(&report)?,
    }

    if report.loaded == CaptureFileType::Unknown {
        bail!("No capture was loaded");
    }
    Ok(())
}

fn run_loads(
    settings: &AppConfig,
    paths: Vec<PathBuf>,
    gather: bool,
    timeout: Duration,
    spinner: &ProgressBar,
) -> Result<LoadReport> {
    let mut manager = CaptureManager::start(FileProbe::new(), settings)?;

    for path in paths {
        manager.load_file(path);
    }
    if !manager.wait_for_idle(timeout) {
        bail!("Timed out after {} ms waiting for loads", timeout.as_millis());
    }

    let mut events: Vec<CaptureEvent> = manager.events().try_iter().collect();
    let loaded = events
        .iter()
        .rev()
        .find_map(|event| match event {
            CaptureEvent::FileLoaded(file_type) => Some(*file_type),
            _ => None,
        })
        .unwrap_or(CaptureFileType::Unknown);

    let mut stats = None;
    if gather && loaded != CaptureFileType::Unknown {
        spinner.set_message("Gathering trace statistics");
        if manager.gather_trace_stats() {
            if !manager.wait_for_idle(timeout) {
                bail!("Timed out after {} ms gathering trace statistics", timeout.as_millis());
            }
            stats = Some(manager.capture_stats());
        }
        events.extend(manager.events().try_iter());
    }

    Ok(LoadReport { events, loaded, stats })
}

fn print_text(report: &LoadReport, output: &Output) {
    for event in &report.events {
        match event {
            CaptureEvent::LoadFailed { reason, path, detail } => {
                let mut message = format!("{}: {reason}", path.display());
                if let Some(detail) = detail {
                    message.push_str(&format!(" ({detail})"));
                }
                output.error(&message);
            }
            CaptureEvent::FileLoaded(CaptureFileType::Unknown) => {
                output.verbose("No capture loaded");
            }
            CaptureEvent::FileLoaded(file_type) => {
                output.success(&format!("Loaded {file_type} capture"));
            }
            CaptureEvent::StatsUpdated => output.verbose("Trace statistics updated"),
        }
    }

    if let Some(stats) = &report.stats {
        output.header("Trace statistics");
        output.key_value("files", &stats.components.to_string(), false);
        output.key_value("size", &format_file_size(stats.capture_bytes), false);
        output.key_value("events", &stats.total_events.to_string(), true);
        for (label, count) in [
            ("draws", stats.draws),
            ("dispatches", stats.dispatches),
            ("clears", stats.clears),
            ("copies", stats.copies),
            ("barriers", stats.barriers),
            ("submits", stats.submits),
            ("markers", stats.markers),
        ] {
            output.key_value(label, &count.to_string(), false);
        }
    }
}

fn print_json(report: &LoadReport) -> Result<()> {
    let events: Vec<_> = report
        .events
        .iter()
        .map(|event| match event {
            CaptureEvent::LoadFailed { reason, path, detail } => json!({
                "event": "load_failed",
                "reason": reason,
                "path": path,
                "detail": detail,
            }),
            CaptureEvent::FileLoaded(file_type) => json!({
                "event": "file_loaded",
                "file_type": file_type,
            }),
            CaptureEvent::StatsUpdated => json!({ "event": "stats_updated" }),
        })
        .collect();

    let document = json!({
        "events": events,
        "loaded": report.loaded,
        "stats": report.stats,
    });
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
