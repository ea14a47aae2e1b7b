#![forbid(unsafe_code)]

//! Foundational value types for the uiprobe test engine.
//!
//! This crate holds everything that is pure data: synthetic input events
//! and the simulated-input snapshot a host frame reads, float geometry,
//! stable item identifiers derived from structural label paths, and the
//! [`TestRef`] reference grammar used to address widgets.
//!
//! Nothing here suspends, queues, or talks to a host; that all lives in
//! `uiprobe-engine`.

pub mod event;
pub mod geometry;
pub mod id;
pub mod refs;

pub use event::{InputEvent, Key, Modifiers, MouseButton, SimulatedInput};
pub use geometry::{Pos, Rect};
pub use id::{ItemId, child_id, path_id};
pub use refs::{ParsedPath, TestRef};
