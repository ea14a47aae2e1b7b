#![forbid(unsafe_code)]

//! Cooperative test scheduler primitives.
//!
//! The test script is the "payload" continuation; the host frame tick is
//! the "driver". The payload is stored as a pinned boxed future and
//! resumed by polling it exactly once per host frame with a no-op waker —
//! no threads, no executor, no shared-memory races: whichever side
//! currently holds control owns all engine state, and control transfer
//! happens only at yield points.
//!
//! A yield point is a two-phase future ([`YieldFrame`]) that is `Pending`
//! on its first poll and `Ready` on the next, so one `.await` suspends the
//! script for exactly one host frame.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use crate::error::{TestError, TestResult};

/// Lifecycle of one registered test.
///
/// `Queued → Running → {Success, Error}`; `Running` is entered on the
/// script's first resume. Suspension between polls is an implicit
/// sub-state of `Running`. Terminal states have no outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// Registered but never queued.
    Unknown,
    /// Waiting in the run queue.
    Queued,
    /// Script is executing (or suspended between frames).
    Running,
    /// Script returned with no recorded failure.
    Success,
    /// A failure was recorded or the run was aborted.
    Error,
}

impl TestStatus {
    /// Whether the status is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

/// Severity of a per-run log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Step-by-step detail.
    Debug,
    /// Normal progress.
    Info,
    /// Suspicious but non-failing.
    Warn,
    /// A recorded failure.
    Error,
}

/// One line of a test run's own log, stamped with the engine frame.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LogEntry {
    /// Engine frame the entry was recorded on.
    pub frame: u64,
    /// Severity.
    pub level: LogLevel,
    /// Message text.
    pub message: String,
}

/// Mutable state of the currently-executing test run.
///
/// One instance per run; dropped when the run finishes. The user-data
/// blob is an opaque `Any` owned by the run and never shared across runs.
pub struct TestRunState {
    /// Current lifecycle status.
    pub status: TestStatus,
    /// Frames since the run started, warm-up included.
    pub total_frames: u64,
    /// Whether the pre-test warm-up window has elapsed.
    pub warmed_up: bool,
    /// Cooperative early-termination request; observed at yield points.
    pub abort: bool,
    /// Current reference scope for relative lookups.
    pub ref_id: uiprobe_core::ItemId,
    /// Path form of the scope, kept for diagnostics and wildcard bases.
    pub ref_path: String,
    /// Nesting depth of in-flight actions (corrective sub-actions).
    pub action_depth: u32,
    /// First recorded failure; later failures are logged but not stored.
    pub first_error: Option<TestError>,
    /// The run's own log.
    pub log: Vec<LogEntry>,
    /// Script-owned untyped variables.
    pub vars: Option<Box<dyn Any>>,
}

impl TestRunState {
    /// Fresh state for a newly dequeued test.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: TestStatus::Queued,
            total_frames: 0,
            warmed_up: false,
            abort: false,
            ref_id: uiprobe_core::ItemId::ROOT,
            ref_path: String::new(),
            action_depth: 0,
            first_error: None,
            log: Vec::new(),
            vars: None,
        }
    }

    /// Record a failure: keeps the first error, logs every one.
    pub fn record_error(&mut self, frame: u64, error: &TestError) {
        self.log.push(LogEntry {
            frame,
            level: LogLevel::Error,
            message: error.to_string(),
        });
        if self.first_error.is_none() {
            self.first_error = Some(error.clone());
        }
    }

    /// Whether the run has failed or been asked to stop.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.abort || self.first_error.is_some()
    }
}

impl Default for TestRunState {
    fn default() -> Self {
        Self::new()
    }
}

/// The boxed script future. Not `Send`: the whole engine is one logical
/// thread of control.
pub type ScriptFuture = Pin<Box<dyn Future<Output = TestResult<()>>>>;

/// The payload continuation: a script future polled once per resume.
pub(crate) struct Coroutine {
    future: ScriptFuture,
}

impl Coroutine {
    pub(crate) fn new(future: ScriptFuture) -> Self {
        Self { future }
    }

    /// Transfer control to the script until its next suspension point.
    pub(crate) fn resume(&mut self) -> Poll<TestResult<()>> {
        let mut cx = Context::from_waker(Waker::noop());
        self.future.as_mut().poll(&mut cx)
    }
}

/// Future that suspends the caller for exactly one resume.
#[derive(Debug, Default)]
pub(crate) struct YieldFrame {
    armed: bool,
}

impl Future for YieldFrame {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        if this.armed {
            Poll::Ready(())
        } else {
            this.armed = true;
            Poll::Pending
        }
    }
}
