#![forbid(unsafe_code)]

//! Input queue: ordered synthetic events awaiting delivery.
//!
//! Only the script side (action layer) enqueues; only the engine's
//! pre-frame step dequeues. Ownership transfer happens exactly at the
//! yield boundary, so the FIFO needs no locking.
//!
//! One host tick consumes at most "one frame's worth" of the queue: the
//! drain stops before a second state change of the same mouse button or
//! key within a single frame. A queued down+up pair therefore spans an
//! input-down frame and an input-up frame, which is what a host that
//! samples input once per frame needs in order to register a click.

use std::collections::VecDeque;

use uiprobe_core::{InputEvent, SimulatedInput};

/// FIFO of pending synthetic input events.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event.
    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    /// Append several events in order.
    pub fn extend(&mut self, events: impl IntoIterator<Item = InputEvent>) {
        self.events.extend(events);
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop all pending events. Used when a run terminates early so stale
    /// input cannot leak into the next test.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Merge one frame's worth of queued events into the snapshot.
    ///
    /// Call after [`SimulatedInput::begin_frame`]. Mouse moves and chars
    /// merge freely; button/key edges are limited to one state change per
    /// control per frame.
    pub fn apply_one_frame(&mut self, sim: &mut SimulatedInput) {
        loop {
            let Some(front) = self.events.front() else {
                break;
            };
            if sim.toggled_this_frame(front) {
                break;
            }
            let Some(event) = self.events.pop_front() else {
                break;
            };
            match event {
                InputEvent::MouseMoveTo(pos) => sim.mouse_pos = pos,
                InputEvent::MouseButtonDown(button) => {
                    let _ = sim.set_button(button, true);
                }
                InputEvent::MouseButtonUp(button) => {
                    let _ = sim.set_button(button, false);
                }
                InputEvent::KeyDown(key, mods) => {
                    let _ = sim.set_key(key, true);
                    sim.modifiers.insert(mods);
                }
                InputEvent::KeyUp(key, mods) => {
                    let _ = sim.set_key(key, false);
                    sim.modifiers.remove(mods);
                }
                InputEvent::Char(c) => sim.chars.push(c),
            }
        }
    }
}
