//! Asynchronous capture loading and trace statistics coordination
//!
//! [`CaptureManager`] lives on the interactive thread and owns a single
//! background worker. Loads and statistics jobs run on the worker one at a
//! time; the manager never blocks on them.
//!
//! # Scheduling rules
//!
//! ```text
//!                 load_file()                    load_file()
//!        ┌──────────┐ ───────▶ ┌──────────┐ ───────────────▶ ┌─────────────────┐
//!        │   Idle   │          │   Busy   │                  │ BusyWithPending │──┐
//!        └──────────┘ ◀─────── └──────────┘ ◀─────────────── └─────────────────┘  │
//!             completion, nothing pending      completion, pending dispatched  ◀──┘
//!                                                                       load_file()
//!                                                                   (replaces pending)
//! ```
//!
//! - A load always cancels an in-flight statistics job first.
//! - While busy, a new load replaces the pending one. A replaced load never
//!   runs and produces no notification.
//! - While busy, `gather_trace_stats` is dropped, not queued.
//! - Statistics read while busy are empty rather than stale.
//!
//! Busy/pending bookkeeping is only touched by the owning thread, inside the
//! request methods and [`CaptureManager::process_completions`], so it needs
//! no lock. Only the capture data itself is shared, behind an `RwLock`.

use crate::cancel::CancellationContext;
use crate::capture::{
    CaptureData, CaptureFileType, CaptureStats, FileClassifier, LoadFailure, LoadFailureReason,
    TraceStats,
};
use crate::capture::pipeline::read_lock;
use crate::config::AppConfig;
use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver, Sender};
use std::path::PathBuf;
use std::sync::{Arc, RwLock, TryLockError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

mod events;
mod worker;

pub use events::CaptureEvent;
use worker::{Completion, Job, Wait, Worker};

/// Coordinator state as seen from the owning thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    /// One job running on the worker
    Busy,
    /// One job running and a load waiting for it to finish
    BusyWithPending,
}

pub struct CaptureManager<D: CaptureData> {
    data: Arc<RwLock<D>>,
    worker: Worker,

    working: bool,
    loading_in_progress: bool,
    pending_load: Option<PathBuf>,

    stats_context: CancellationContext,
    stats: CaptureStats,

    event_tx: Sender<CaptureEvent>,
    event_rx: Receiver<CaptureEvent>,
}

impl<D: CaptureData> CaptureManager<D> {
    /// Take ownership of the capture data and start the worker thread
    pub fn start(data: D, config: &AppConfig) -> Result<Self> {
        let data = Arc::new(RwLock::new(data));
        let worker = Worker::spawn(
            Arc::clone(&data),
            FileClassifier::new(config.capture.clone()),
            TraceStats::new(config.stats.cancel_poll_stride),
        )
        .context("Failed to start capture worker thread")?;

        let (event_tx, event_rx) = channel::unbounded();

        Ok(Self {
            data,
            worker,
            working: false,
            loading_in_progress: false,
            pending_load: None,
            stats_context: CancellationContext::default(),
            stats: CaptureStats::default(),
            event_tx,
            event_rx,
        })
    }

    /// Notifications, in the order they were emitted
    pub fn events(&self) -> &Receiver<CaptureEvent> {
        &self.event_rx
    }

    pub fn state(&self) -> CoordinatorState {
        match (self.working, self.pending_load.is_some()) {
            (false, _) => CoordinatorState::Idle,
            (true, false) => CoordinatorState::Busy,
            (true, true) => CoordinatorState::BusyWithPending,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.working
    }

    /// True from a load request until the last pending load has finished
    pub fn is_loading(&self) -> bool {
        self.loading_in_progress
    }

    /// Request loading `path`.
    ///
    /// Runs immediately when idle; otherwise becomes the pending load,
    /// replacing any load that was already pending.
    pub fn load_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();

        if !self.stats_context.is_null() && self.stats_context.cancel() {
            debug!("Cancelled trace stats gathering for load of {}", path.display());
        }

        self.loading_in_progress = true;
        if self.working {
            if let Some(superseded) = self.pending_load.replace(path) {
                warn!("Pending load of {} superseded", superseded.display());
            }
            return;
        }
        self.dispatch_load(path);
    }

    /// Request statistics for the loaded capture.
    ///
    /// Returns `false` when the request was dropped because a job is running.
    pub fn gather_trace_stats(&mut self) -> bool {
        if self.working {
            debug!("Trace stats request ignored while busy");
            return false;
        }

        if !self.stats_context.is_null() {
            self.stats_context.cancel();
        }
        self.stats_context = CancellationContext::new();

        self.working = true;
        let job = Job::GatherStats {
            context: self.stats_context.clone(),
        };
        if !self.worker.submit(job) {
            error!("Capture worker is not running; trace stats request dropped");
            self.working = false;
            return false;
        }
        true
    }

    /// Last computed statistics, or empty statistics while a job is running
    pub fn capture_stats(&self) -> CaptureStats {
        if self.working {
            return CaptureStats::default();
        }
        self.stats.clone()
    }

    /// Apply every completion that has arrived, without blocking.
    ///
    /// Call this regularly from the owning thread. Returns how many
    /// completions were handled.
    pub fn process_completions(&mut self) -> usize {
        let mut handled = 0;
        while let Some(completion) = self.worker.try_completion() {
            self.handle_completion(completion);
            handled += 1;
        }
        handled
    }

    /// Block until no job is running or `timeout` elapses.
    ///
    /// Returns `true` when idle.
    pub fn wait_for_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.process_completions();

        while self.working {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.worker.completion_timeout(remaining) {
                Wait::Completed(completion) => self.handle_completion(completion),
                Wait::TimedOut => return false,
                Wait::WorkerGone => {
                    error!("Capture worker exited with a job in flight");
                    return false;
                }
            }
        }
        true
    }

    /// Read the capture data, waiting for a running load to release it
    pub fn with_data<R>(&self, f: impl FnOnce(&D) -> R) -> R {
        let guard = read_lock(&self.data);
        f(&guard)
    }

    /// Read the capture data unless a load currently holds it
    pub fn try_with_data<R>(&self, f: impl FnOnce(&D) -> R) -> Option<R> {
        match self.data.try_read() {
            Ok(guard) => Some(f(&guard)),
            Err(TryLockError::Poisoned(poisoned)) => Some(f(&poisoned.into_inner())),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    fn dispatch_load(&mut self, path: PathBuf) {
        info!("Loading {}", path.display());
        self.working = true;
        // Stats describe the capture being replaced
        self.stats = CaptureStats::default();

        if !self.worker.submit(Job::Load { path: path.clone() }) {
            error!("Capture worker is not running; load of {} dropped", path.display());
            let failure = LoadFailure::new(LoadFailureReason::Unknown, &path)
                .with_detail("capture worker is not running");
            self.on_load_done(Err(failure));
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Load { path, result } => {
                debug!("Load of {} completed", path.display());
                self.on_load_done(result);
            }
            Completion::Stats { stats } => self.on_stats_done(stats),
        }
    }

    fn on_load_done(&mut self, result: Result<CaptureFileType, LoadFailure>) {
        self.working = false;
        let next = self.pending_load.take();
        if next.is_none() {
            self.loading_in_progress = false;
        }

        match result {
            Ok(file_type) => self.emit(CaptureEvent::FileLoaded(file_type)),
            Err(failure) if failure.is_cancelled() => {
                debug!("Load of {} cancelled", failure.path.display());
            }
            Err(failure) => {
                warn!("{}", failure);
                self.emit(CaptureEvent::LoadFailed {
                    reason: failure.reason,
                    path: failure.path,
                    detail: failure.detail,
                });
                self.emit(CaptureEvent::FileLoaded(CaptureFileType::Unknown));
            }
        }

        if let Some(next) = next {
            self.dispatch_load(next);
        }
    }

    fn on_stats_done(&mut self, stats: Option<CaptureStats>) {
        self.working = false;
        let updated = stats.is_some();
        if let Some(stats) = stats {
            self.stats = stats;
        }

        if let Some(next) = self.pending_load.take() {
            self.dispatch_load(next);
            return;
        }

        if updated {
            self.emit(CaptureEvent::StatsUpdated);
        }
    }

    fn emit(&self, event: CaptureEvent) {
        // The receiver lives in self, so this cannot fail while we exist
        let _ = self.event_tx.send(event);
    }
}

impl<D: CaptureData> Drop for CaptureManager<D> {
    fn drop(&mut self) {
        self.stats_context.cancel();
        self.worker.shutdown();
    }
}
