#![forbid(unsafe_code)]

//! uiprobe-engine: an in-process test engine for immediate-mode GUIs.
//!
//! The host application keeps its frame loop and calls
//! [`TestEngine::tick`] once per frame. Test scripts are ordinary async
//! functions resumed cooperatively between frames: they look up widgets
//! by stable id or label path, inject synthetic input one frame's worth
//! at a time, and drive compound actions (click, check, open, drag) that
//! retry, time out in frames, and verify their own post-conditions.
//!
//! Nothing here renders or threads. All state lives on one logical
//! thread; control alternates between the host frame and the suspended
//! script at explicit yield points.
//!
//! # Design Notes
//!
//! - Frame-counted determinism: every timeout and retry is counted in
//!   frames driven by the host's `dt`, so a run is reproducible from its
//!   frame sequence alone.
//! - The registry is rebuilt every frame from what the GUI callback
//!   reports; queries never see state older than the current frame.
//! - Failures are values ([`TestError`]) flowing through `Result`; only
//!   authoring mistakes and aborts are fatal to the script.

pub mod actions;
pub mod context;
pub mod engine;
pub mod error;
pub mod gui;
pub mod input;
pub mod query;
pub mod registry;
pub mod sched;
pub mod state;
pub mod summary;
pub mod window;

pub use actions::Action;
pub use context::TestCtx;
pub use engine::TestEngine;
pub use error::{TestError, TestResult};
pub use gui::GuiFrame;
pub use input::InputQueue;
pub use registry::{ItemInfo, ItemRegistry, ItemReport, ItemStatusFlags};
pub use sched::{LogEntry, LogLevel, ScriptFuture, TestStatus};
pub use state::EngineConfig;
pub use summary::{RunSummary, TestRecord, to_jsonl};
pub use window::{NullWindowOps, WindowOps};

// Re-export the core vocabulary so scripts need only this crate.
pub use uiprobe_core::{
    InputEvent, ItemId, Key, Modifiers, MouseButton, Pos, Rect, SimulatedInput, TestRef, child_id,
    path_id,
};
