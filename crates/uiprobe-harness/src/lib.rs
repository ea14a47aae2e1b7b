#![forbid(unsafe_code)]

//! uiprobe-harness: reference widget kit and end-to-end fixtures.
//!
//! The engine only defines the contract a host must honor (rebuild the
//! item registry every frame from a `GuiFrame`, honor the window hooks).
//! This crate is a complete, deliberately small host that honors it: an
//! immediate-mode widget kit with real interaction semantics, retained
//! state, and a standard two-window fixture. The integration suites under
//! `tests/` drive full engine runs against it.

pub mod fixture;
pub mod state;
pub mod ui;

pub use fixture::{DemoApp, OVERFLOW_ROWS};
pub use state::{HarnessWindowOps, UiState, WindowState};
pub use ui::{INDENT, ROW_GAP, ROW_HEIGHT, TITLE_HEIGHT, Ui};
