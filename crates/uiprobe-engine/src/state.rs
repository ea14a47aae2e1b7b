#![forbid(unsafe_code)]

//! Shared engine state.
//!
//! One `Rc<RefCell<EngineState>>` is shared between the engine driver and
//! every [`crate::TestCtx`] clone. Mutation strictly alternates between
//! the driver (during a frame) and the script (between frames); borrows
//! are always scoped to a single call and never held across a yield.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use uiprobe_core::{ItemId, SimulatedInput};

use crate::input::InputQueue;
use crate::registry::ItemRegistry;
use crate::window::{NullWindowOps, WindowOps};

/// Engine tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delta time per frame when the engine drives its own loop.
    pub fixed_dt: f32,
    /// Frames the GUI draws before the script's first resume.
    pub warmup_frames: u64,
    /// Hard ceiling on frames per test; exceeding it is an authoring error.
    pub max_frames_per_test: u64,
    /// Default wall-clock budget for blocking waits, in seconds.
    pub wait_budget_secs: f32,
    /// Frame rate used to convert wall-clock budgets into frame counts.
    pub fps_hint: f32,
    /// Ceiling on nested action depth (corrective sub-actions).
    pub action_depth_max: u32,
    /// Teleport the mouse instead of pacing it across frames.
    pub run_fast: bool,
    /// Mouse travel speed in pixels per second when not running fast.
    pub mouse_speed: f32,
    /// Pixel step per frame for incremental drag movement.
    pub drag_step_px: f32,
    /// Pass ceiling for `item_action_all` on unstable trees.
    pub action_all_max_passes: u32,
    /// Resumes granted to a script after a fatal condition before its
    /// future is dropped.
    pub abort_drain_resumes: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            warmup_frames: 2,
            max_frames_per_test: 10_000,
            wait_budget_secs: 2.0,
            fps_hint: 60.0,
            action_depth_max: 8,
            run_fast: true,
            mouse_speed: 600.0,
            drag_step_px: 30.0,
            action_all_max_passes: 8,
            abort_drain_resumes: 64,
        }
    }
}

impl EngineConfig {
    /// The default blocking-wait budget converted to frames.
    #[must_use]
    pub fn wait_budget_frames(&self) -> u64 {
        (self.wait_budget_secs * self.fps_hint).ceil().max(0.0) as u64
    }
}

/// State shared between the driver and the script side.
pub(crate) struct EngineState {
    pub config: EngineConfig,
    /// Global frame counter, incremented once per host tick.
    pub frame_count: u64,
    /// Simulated seconds elapsed.
    pub elapsed: f64,
    /// Delta time of the most recent frame.
    pub last_dt: f32,
    pub registry: ItemRegistry,
    pub queue: InputQueue,
    pub sim: SimulatedInput,
    /// Item currently holding synthetic navigation focus.
    pub nav_focus: ItemId,
    /// Engine-level abort: stops the active run and drains the queue.
    pub abort_all: bool,
    pub window_ops: Box<dyn WindowOps>,
}

impl EngineState {
    pub(crate) fn new(config: EngineConfig) -> Self {
        Self {
            config,
            frame_count: 0,
            elapsed: 0.0,
            last_dt: 0.0,
            registry: ItemRegistry::new(),
            queue: InputQueue::new(),
            sim: SimulatedInput::new(),
            nav_focus: ItemId::ROOT,
            abort_all: false,
            window_ops: Box::new(NullWindowOps),
        }
    }
}

pub(crate) type SharedState = Rc<RefCell<EngineState>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_budget_rounds_up_to_whole_frames() {
        let config = EngineConfig {
            wait_budget_secs: 0.05,
            fps_hint: 60.0,
            ..EngineConfig::default()
        };
        assert_eq!(config.wait_budget_frames(), 3);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.warmup_frames, config.warmup_frames);
        assert_eq!(back.max_frames_per_test, config.max_frames_per_test);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"run_fast": false}"#).unwrap();
        assert!(!config.run_fast);
        assert_eq!(config.warmup_frames, EngineConfig::default().warmup_frames);
    }
}
