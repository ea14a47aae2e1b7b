#![forbid(unsafe_code)]

//! Test context: the facade a test script holds.
//!
//! `TestCtx` is a cheap cloneable handle over the shared engine state and
//! the per-run state. It threads the current reference scope through all
//! lookups, exposes the yield family, logging, the user-data blob, and
//! the check/require assertion surface. Interaction methods (mouse,
//! keyboard, item actions, windows) live in the action layer module but
//! hang off the same type.
//!
//! Scripts are ordinary `async` functions taking a `TestCtx` by value:
//!
//! ```ignore
//! engine.register_test("demo", "click_go", gui, |ctx: TestCtx| async move {
//!     ctx.set_ref("Test Window")?;
//!     ctx.item_click("Go").await?;
//!     Ok(())
//! });
//! ```

use std::rc::Rc;

use tracing::{debug, error, info, warn};
use uiprobe_core::{ItemId, ParsedPath, TestRef, path_id};

use crate::error::{TestError, TestResult};
use crate::sched::{LogEntry, LogLevel, TestRunState, YieldFrame};
use crate::state::SharedState;

/// Facade handle passed into test scripts. Clones share the same run.
#[derive(Clone)]
pub struct TestCtx {
    pub(crate) shared: SharedState,
    pub(crate) run: Rc<std::cell::RefCell<TestRunState>>,
    pub(crate) test_name: Rc<str>,
}

impl TestCtx {
    // --- Timing and suspension ---------------------------------------------

    /// Suspend the script for exactly one host frame.
    pub async fn yield_frame(&self) {
        YieldFrame::default().await;
    }

    /// Suspend for `count` host frames.
    pub async fn yield_frames(&self, count: u64) {
        for _ in 0..count {
            if self.is_error() {
                break;
            }
            self.yield_frame().await;
        }
    }

    /// Suspend until the run's frame counter reaches `target_frame`.
    pub async fn yield_until(&self, target_frame: u64) {
        while self.frame_count() < target_frame && !self.is_error() {
            self.yield_frame().await;
        }
    }

    /// Suspend until `seconds` of simulated time have elapsed, using the
    /// host's per-frame delta time.
    pub async fn sleep(&self, seconds: f32) {
        let mut remaining = seconds;
        while remaining > 0.0 && !self.is_error() {
            self.yield_frame().await;
            remaining -= self.shared.borrow().last_dt;
        }
    }

    /// A short settle pause (a few frames' worth of simulated time).
    pub async fn sleep_short(&self) {
        self.sleep(0.1).await;
    }

    /// Frames since this run started, warm-up included.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.run.borrow().total_frames
    }

    /// Global engine frame number.
    #[must_use]
    pub fn engine_frame(&self) -> u64 {
        self.shared.borrow().frame_count
    }

    /// Simulated seconds elapsed since the engine started.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.shared.borrow().elapsed
    }

    // --- Error and abort surface -------------------------------------------

    /// True once a failure has been recorded or an abort requested. The
    /// standard early-exit check after any action that can fail.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.run.borrow().is_error() || self.shared.borrow().abort_all
    }

    /// Request cooperative termination of this run; observed at the next
    /// suspension point.
    pub fn abort(&self) {
        self.run.borrow_mut().abort = true;
    }

    /// Record a failure on the run without returning it. The first error
    /// sticks; all are logged.
    pub fn record_error(&self, err: &TestError) {
        error!(test = %self.test_name, %err, "test failure");
        let frame = self.shared.borrow().frame_count;
        self.run.borrow_mut().record_error(frame, err);
    }

    /// Record and return, for `?`-style propagation out of helpers.
    pub(crate) fn fail<T>(&self, err: TestError) -> TestResult<T> {
        self.record_error(&err);
        Err(err)
    }

    // --- Reference scope ---------------------------------------------------

    /// Set the base reference subsequent relative lookups resolve against.
    ///
    /// Wildcard paths are resolved against the current frame's registry;
    /// plain paths and ids resolve by pure hashing and always succeed.
    pub fn set_ref(&self, r: impl Into<TestRef>) -> TestResult<()> {
        let r = r.into();
        debug!(test = %self.test_name, target = %r.describe(), "set_ref");
        match &r {
            TestRef::Id(id) => {
                let mut run = self.run.borrow_mut();
                run.ref_id = *id;
                run.ref_path = id.to_string();
                Ok(())
            }
            TestRef::Path(path) => {
                let id = self.resolve_id(&r)?;
                let mut run = self.run.borrow_mut();
                run.ref_id = id;
                run.ref_path = path.clone();
                Ok(())
            }
        }
    }

    /// Identifier a reference resolves to under the current scope.
    pub fn get_id(&self, r: impl Into<TestRef>) -> TestResult<ItemId> {
        self.resolve_id(&r.into())
    }

    /// Resolve a reference to an id. Plain paths hash from the scope (or
    /// the root for absolute paths); wildcard paths consult the current
    /// frame's registry and fail when nothing matches this frame.
    pub(crate) fn resolve_id(&self, r: &TestRef) -> TestResult<ItemId> {
        match r {
            TestRef::Id(id) => Ok(*id),
            TestRef::Path(path) => {
                let Some(parsed) = ParsedPath::parse(path) else {
                    return self.fail(TestError::authoring(format!("malformed path: '{path}'")));
                };
                let base = if parsed.absolute {
                    ItemId::ROOT
                } else {
                    self.run.borrow().ref_id
                };
                let mut prefix_id = base;
                for segment in &parsed.prefix {
                    prefix_id = uiprobe_core::child_id(prefix_id, segment);
                }
                if !parsed.wildcard {
                    return Ok(prefix_id);
                }
                let shared = self.shared.borrow();
                let (found, count) = shared
                    .registry
                    .find_by_label_suffix(prefix_id, &parsed.suffix);
                if count > 1 {
                    warn!(
                        test = %self.test_name,
                        path,
                        candidates = count,
                        "wildcard matched more than one item; using first in draw order"
                    );
                }
                found.ok_or_else(|| TestError::lookup(path.clone(), 0))
            }
        }
    }

    /// Human-readable form of a reference including the current scope,
    /// for diagnostics.
    pub(crate) fn describe_ref(&self, r: &TestRef) -> String {
        match r {
            TestRef::Id(id) => id.to_string(),
            TestRef::Path(path) => {
                if path.starts_with('/') {
                    path.clone()
                } else {
                    let scope = &self.run.borrow().ref_path;
                    if scope.is_empty() {
                        path.clone()
                    } else {
                        format!("{scope}/{path}")
                    }
                }
            }
        }
    }

    // --- Logging -----------------------------------------------------------

    /// Append a line to the run's own log and to the tracing stream.
    pub fn log(&self, message: impl Into<String>) {
        self.log_at(LogLevel::Info, message.into());
    }

    /// Append a debug-level line.
    pub fn log_debug(&self, message: impl Into<String>) {
        self.log_at(LogLevel::Debug, message.into());
    }

    pub(crate) fn log_at(&self, level: LogLevel, message: String) {
        match level {
            LogLevel::Debug => debug!(test = %self.test_name, "{message}"),
            LogLevel::Info => info!(test = %self.test_name, "{message}"),
            LogLevel::Warn => warn!(test = %self.test_name, "{message}"),
            LogLevel::Error => error!(test = %self.test_name, "{message}"),
        }
        let frame = self.shared.borrow().frame_count;
        self.run.borrow_mut().log.push(LogEntry {
            frame,
            level,
            message,
        });
    }

    // --- User data ---------------------------------------------------------

    /// Install the run's user-data blob. Replaces any previous value;
    /// dropped when the run finishes.
    pub fn set_vars<T: 'static>(&self, value: T) {
        self.run.borrow_mut().vars = Some(Box::new(value));
    }

    /// Access the user-data blob as `T`. The borrow is scoped to the
    /// closure so it can never be held across a yield.
    pub fn with_vars<T: 'static, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.run
            .borrow_mut()
            .vars
            .as_mut()
            .and_then(|blob| blob.downcast_mut::<T>())
            .map(f)
    }

    // --- Assertion surface -------------------------------------------------

    /// Record the outcome of an explicit check. On failure the run is
    /// marked errored but control returns to the caller, which decides
    /// whether to continue (`check!`) or early-return (`require!`).
    pub fn report_check(&self, ok: bool, expr: &str, file: &'static str, line: u32) -> bool {
        if ok {
            self.log_debug(format!("ok: {expr}"));
        } else {
            self.record_error(&TestError::assertion(expr, file, line));
        }
        ok
    }
}

/// Record a boolean check; evaluates to whether it passed. A failure
/// marks the run errored but execution continues.
#[macro_export]
macro_rules! check {
    ($ctx:expr, $cond:expr) => {
        $ctx.report_check($cond, stringify!($cond), file!(), line!())
    };
}

/// Record an equality check with both values in the diagnostic.
#[macro_export]
macro_rules! check_eq {
    ($ctx:expr, $left:expr, $right:expr) => {{
        let (l, r) = (&$left, &$right);
        let ok = l == r;
        let expr = if ok {
            ::std::string::String::from(concat!(stringify!($left), " == ", stringify!($right)))
        } else {
            format!(
                "{} == {} (left: {:?}, right: {:?})",
                stringify!($left),
                stringify!($right),
                l,
                r
            )
        };
        $ctx.report_check(ok, &expr, file!(), line!())
    }};
}

/// Like [`check!`] but early-returns `Err` from the enclosing function on
/// failure.
#[macro_export]
macro_rules! require {
    ($ctx:expr, $cond:expr) => {
        if !$crate::check!($ctx, $cond) {
            return Err($crate::TestError::assertion(
                stringify!($cond),
                file!(),
                line!(),
            ));
        }
    };
}

/// Like [`check_eq!`] but early-returns `Err` on failure.
#[macro_export]
macro_rules! require_eq {
    ($ctx:expr, $left:expr, $right:expr) => {
        if !$crate::check_eq!($ctx, $left, $right) {
            return Err($crate::TestError::assertion(
                concat!(stringify!($left), " == ", stringify!($right)),
                file!(),
                line!(),
            ));
        }
    };
}
