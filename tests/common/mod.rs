//! Scripted capture-data double for coordinator tests
//!
//! Every load is recorded. With a gate installed, load steps and event reads
//! block until the test releases them, so the test decides exactly when the
//! worker is busy.

#![allow(dead_code)]

use capflow::capture::{CaptureData, CaptureFiles, LoadResult, TraceEvent};
use crossbeam::channel::{self, Receiver, Sender};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Test-side handle to a gate: each `open` lets exactly one blocked call through
#[derive(Clone)]
pub struct Gate {
    entered_rx: Receiver<()>,
    release_tx: Sender<()>,
}

impl Gate {
    /// Wait until the worker is parked at the gate
    pub fn wait_entered(&self) {
        self.entered_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("worker never reached the gate");
    }

    pub fn open(&self) {
        self.release_tx.send(()).unwrap();
    }
}

struct GateInner {
    entered_tx: Sender<()>,
    release_rx: Receiver<()>,
}

impl GateInner {
    fn pass(&self) {
        let _ = self.entered_tx.send(());
        let _ = self.release_rx.recv_timeout(Duration::from_secs(10));
    }
}

fn gate() -> (Gate, GateInner) {
    let (entered_tx, entered_rx) = channel::unbounded();
    let (release_tx, release_rx) = channel::unbounded();
    (
        Gate {
            entered_rx,
            release_tx,
        },
        GateInner {
            entered_tx,
            release_rx,
        },
    )
}

pub struct ScriptedCapture {
    loads: Arc<Mutex<Vec<PathBuf>>>,
    load_result: LoadResult,
    parse_ok: bool,
    events: Vec<TraceEvent>,
    load_gate: Option<GateInner>,
    events_gate: Option<GateInner>,
}

impl ScriptedCapture {
    pub fn new() -> Self {
        Self {
            loads: Arc::default(),
            load_result: LoadResult::Success,
            parse_ok: true,
            events: Vec::new(),
            load_gate: None,
            events_gate: None,
        }
    }

    /// Shared record of every path a load step was called with
    pub fn load_log(&self) -> Arc<Mutex<Vec<PathBuf>>> {
        Arc::clone(&self.loads)
    }

    pub fn with_load_result(mut self, result: LoadResult) -> Self {
        self.load_result = result;
        self
    }

    pub fn with_parse_failure(mut self) -> Self {
        self.parse_ok = false;
        self
    }

    pub fn with_events(mut self, events: Vec<TraceEvent>) -> Self {
        self.events = events;
        self
    }

    /// Block every load step until released
    pub fn gated_loads(mut self) -> (Self, Gate) {
        let (gate, inner) = gate();
        self.load_gate = Some(inner);
        (self, gate)
    }

    /// Block every `events()` read until released
    pub fn gated_events(mut self) -> (Self, Gate) {
        let (gate, inner) = gate();
        self.events_gate = Some(inner);
        (self, gate)
    }

    fn load(&mut self, files: &CaptureFiles) -> LoadResult {
        self.loads
            .lock()
            .unwrap()
            .push(files.capture_path().to_path_buf());
        if let Some(gate) = &self.load_gate {
            gate.pass();
        }
        self.load_result
    }
}

impl CaptureData for ScriptedCapture {
    fn load_combined(&mut self, files: &CaptureFiles) -> LoadResult {
        self.load(files)
    }

    fn parse_combined(&mut self) -> bool {
        self.parse_ok
    }

    fn load_primary(&mut self, files: &CaptureFiles) -> LoadResult {
        self.load(files)
    }

    fn parse_primary(&mut self) -> bool {
        self.parse_ok
    }

    fn load_auxiliary(&mut self, files: &CaptureFiles) -> LoadResult {
        self.load(files)
    }

    fn parse_auxiliary(&mut self) -> bool {
        self.parse_ok
    }

    fn events(&self) -> &[TraceEvent] {
        if let Some(gate) = &self.events_gate {
            gate.pass();
        }
        &self.events
    }
}

/// Create empty primary captures named `names` in a fresh directory
pub fn capture_dir(names: &[&str]) -> (tempfile::TempDir, Vec<PathBuf>) {
    let dir = tempfile::TempDir::new().unwrap();
    let paths = names
        .iter()
        .map(|name| {
            let path = dir.path().join(name);
            std::fs::write(&path, b"capture").unwrap();
            path
        })
        .collect();
    (dir, paths)
}
