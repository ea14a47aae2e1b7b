#![forbid(unsafe_code)]

//! Failure taxonomy.
//!
//! Failures are data, not control flow, at the engine/host boundary: a
//! script fault never aborts the host process. Most variants are recorded
//! on the run state and let the script keep executing; `Authoring` is
//! fatal to the run and marks the test itself as broken rather than its
//! assertions as failed.

use thiserror::Error;

/// Result alias used throughout the engine and by test scripts.
pub type TestResult<T> = Result<T, TestError>;

/// Everything that can go wrong inside a test run.
#[derive(Debug, Clone, Error)]
pub enum TestError {
    /// A target reference did not resolve within its wait budget.
    #[error("item not found: '{path}' (waited {frames} frames)")]
    Lookup {
        /// The attempted reference, as written by the script.
        path: String,
        /// Frames spent waiting before giving up.
        frames: u64,
    },

    /// An interaction located its target but the post-condition did not hold.
    #[error("{action} on '{path}' failed: {detail}")]
    Action {
        /// Action name ("Click", "Check", ...).
        action: &'static str,
        /// The attempted reference.
        path: String,
        /// Expected vs. actual state.
        detail: String,
    },

    /// A blocking wait exceeded its frame budget.
    #[error("timed out waiting for {what} after {frames} frames")]
    Timeout {
        /// What was being waited for.
        what: String,
        /// Frames spent waiting.
        frames: u64,
    },

    /// The test itself is broken: scheduler ceiling hit, runaway action
    /// recursion, or a malformed reference. Fatal to the run.
    #[error("authoring error: {detail}")]
    Authoring {
        /// What the author got wrong.
        detail: String,
    },

    /// An explicit check failed.
    #[error("check failed: {expr} at {file}:{line}")]
    Assertion {
        /// The failed expression (with values where available).
        expr: String,
        /// Source file of the check.
        file: &'static str,
        /// Source line of the check.
        line: u32,
    },

    /// The run was aborted (engine-level or test-level abort flag).
    #[error("test aborted")]
    Aborted,
}

impl TestError {
    /// Lookup failure for a reference that never appeared.
    #[must_use]
    pub fn lookup(path: impl Into<String>, frames: u64) -> Self {
        Self::Lookup {
            path: path.into(),
            frames,
        }
    }

    /// Post-condition mismatch on an otherwise-located interaction.
    #[must_use]
    pub fn action(action: &'static str, path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Action {
            action,
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Blocking wait ran out of frames.
    #[must_use]
    pub fn timeout(what: impl Into<String>, frames: u64) -> Self {
        Self::Timeout {
            what: what.into(),
            frames,
        }
    }

    /// Broken-test failure.
    #[must_use]
    pub fn authoring(detail: impl Into<String>) -> Self {
        Self::Authoring {
            detail: detail.into(),
        }
    }

    /// Failed explicit check.
    #[must_use]
    pub fn assertion(expr: impl Into<String>, file: &'static str, line: u32) -> Self {
        Self::Assertion {
            expr: expr.into(),
            file,
            line,
        }
    }

    /// Whether this failure ends the run immediately instead of letting
    /// remaining yield points drain.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Authoring { .. } | Self::Aborted)
    }
}
