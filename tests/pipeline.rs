//! Locking and dispatch of the load/stats pipeline

mod common;

use capflow::cancel::CancellationContext;
use capflow::capture::{
    CaptureFileType, FileClassifier, LoadFailureReason, TraceEvent, TraceStats, pipeline,
};
use common::{ScriptedCapture, capture_dir};
use crossbeam::channel;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

#[test]
fn test_stats_wait_for_running_load() {
    let (_dir, paths) = capture_dir(&["a.rd"]);
    let (data, gate) = ScriptedCapture::new()
        .with_events(vec![TraceEvent::Clear, TraceEvent::Copy])
        .gated_loads();
    let data = Arc::new(RwLock::new(data));

    let loader = {
        let data = Arc::clone(&data);
        let path = paths[0].clone();
        thread::spawn(move || {
            pipeline::load(
                &CancellationContext::background(),
                &FileClassifier::default(),
                &path,
                &data,
            )
        })
    };
    gate.wait_entered();

    let (done_tx, done_rx) = channel::bounded(1);
    let reader = {
        let data = Arc::clone(&data);
        thread::spawn(move || {
            let stats =
                pipeline::gather_stats(&CancellationContext::new(), &TraceStats::default(), &data);
            done_tx.send(stats).unwrap();
        })
    };

    // Write lock is held by the parked load
    assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());

    gate.open();
    assert_eq!(loader.join().unwrap(), Ok(CaptureFileType::PrimaryOnly));

    let stats = done_rx
        .recv_timeout(Duration::from_secs(5))
        .unwrap()
        .unwrap();
    assert_eq!(stats.total_events, 2);
    reader.join().unwrap();
}

#[test]
fn test_cancelled_context_skips_load() {
    let (_dir, paths) = capture_dir(&["a.rd"]);
    let data = ScriptedCapture::new();
    let loads = data.load_log();
    let data = RwLock::new(data);

    let context = CancellationContext::new();
    context.cancel();

    let failure = pipeline::load(&context, &FileClassifier::default(), &paths[0], &data).unwrap_err();
    assert_eq!(failure.reason, LoadFailureReason::Cancelled);
    assert!(loads.lock().unwrap().is_empty());
}

#[test]
fn test_cancelled_stats_return_none() {
    let data = RwLock::new(ScriptedCapture::new().with_events(vec![TraceEvent::Draw; 10]));
    let context = CancellationContext::new();
    context.cancel();

    assert!(pipeline::gather_stats(&context, &TraceStats::new(1), &data).is_none());
}

#[test]
fn test_version_error_maps_to_reason() {
    let (_dir, paths) = capture_dir(&["a.rd"]);
    let data = RwLock::new(
        ScriptedCapture::new().with_load_result(capflow::capture::LoadResult::VersionError),
    );

    let failure = pipeline::load(
        &CancellationContext::background(),
        &FileClassifier::default(),
        &paths[0],
        &data,
    )
    .unwrap_err();
    assert_eq!(failure.reason, LoadFailureReason::VersionError);
    assert_eq!(failure.path, paths[0]);
}
