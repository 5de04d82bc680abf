use crate::cancel::CancellationContext;
use crate::capture::{
    CaptureData, CaptureFileType, CaptureStats, FileClassifier, LoadFailure, LoadFailureReason,
    TraceStats, pipeline,
};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Work sent to the worker thread
#[derive(Debug)]
pub(crate) enum Job {
    Load { path: PathBuf },
    GatherStats { context: CancellationContext },
}

/// Result sent back once a job's effects are committed and its lock released
#[derive(Debug)]
pub(crate) enum Completion {
    Load {
        path: PathBuf,
        result: Result<CaptureFileType, LoadFailure>,
    },
    /// `None` when the job was cancelled
    Stats { stats: Option<CaptureStats> },
}

pub(crate) enum Wait {
    Completed(Completion),
    TimedOut,
    WorkerGone,
}

/// What the worker thread needs to run jobs
struct WorkerContext<D> {
    data: Arc<RwLock<D>>,
    classifier: FileClassifier,
    trace_stats: TraceStats,
    job_rx: Receiver<Job>,
    completion_tx: Sender<Completion>,
}

/// Single background thread executing one job at a time
pub(crate) struct Worker {
    job_tx: Option<Sender<Job>>,
    completion_rx: Receiver<Completion>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn<D: CaptureData>(
        data: Arc<RwLock<D>>,
        classifier: FileClassifier,
        trace_stats: TraceStats,
    ) -> std::io::Result<Self> {
        let (job_tx, job_rx) = channel::unbounded();
        let (completion_tx, completion_rx) = channel::unbounded();

        let ctx = WorkerContext {
            data,
            classifier,
            trace_stats,
            job_rx,
            completion_tx,
        };

        let handle = thread::Builder::new()
            .name("capture-worker".to_string())
            .spawn(move || worker_thread(ctx))?;

        Ok(Self {
            job_tx: Some(job_tx),
            completion_rx,
            handle: Some(handle),
        })
    }

    /// Queue a job. Returns `false` if the worker thread is gone.
    pub fn submit(&self, job: Job) -> bool {
        match &self.job_tx {
            Some(tx) => tx.send(job).is_ok(),
            None => false,
        }
    }

    pub fn try_completion(&self) -> Option<Completion> {
        self.completion_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next completion
    pub fn completion_timeout(&self, timeout: Duration) -> Wait {
        match self.completion_rx.recv_timeout(timeout) {
            Ok(completion) => Wait::Completed(completion),
            Err(RecvTimeoutError::Timeout) => Wait::TimedOut,
            Err(RecvTimeoutError::Disconnected) => Wait::WorkerGone,
        }
    }

    /// Close the job channel and wait for the running job to finish
    pub fn shutdown(&mut self) {
        drop(self.job_tx.take());
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            error!("Capture worker thread panicked during shutdown");
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_thread<D: CaptureData>(ctx: WorkerContext<D>) {
    while let Ok(job) = ctx.job_rx.recv() {
        let completion = run_job(&ctx, job);
        if ctx.completion_tx.send(completion).is_err() {
            break; // Coordinator dropped
        }
    }
    debug!("Capture worker exiting");
}

fn run_job<D: CaptureData>(ctx: &WorkerContext<D>, job: Job) -> Completion {
    let begin = Instant::now();

    match job {
        Job::Load { path } => {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                pipeline::load(
                    &CancellationContext::background(),
                    &ctx.classifier,
                    &path,
                    &ctx.data,
                )
            }))
            .unwrap_or_else(|_| {
                error!("Load job for {} panicked", path.display());
                Err(LoadFailure::new(LoadFailureReason::Unknown, &path)
                    .with_detail("load job panicked"))
            });

            info!(
                "Time used to load the capture is {:.3} seconds",
                begin.elapsed().as_secs_f64()
            );
            Completion::Load { path, result }
        }
        Job::GatherStats { context } => {
            let stats = panic::catch_unwind(AssertUnwindSafe(|| {
                pipeline::gather_stats(&context, &ctx.trace_stats, &ctx.data)
            }))
            .unwrap_or_else(|_| {
                error!("Trace stats job panicked");
                None
            });

            let seconds = begin.elapsed().as_secs_f64();
            if context.is_cancelled() {
                info!("Trace stats cancelled after {:.3} seconds", seconds);
            } else {
                info!("Time used to gather the trace stats is {:.3} seconds", seconds);
            }
            Completion::Stats { stats }
        }
    }
}
