#![forbid(unsafe_code)]

//! Synthetic input events and the simulated-input snapshot.
//!
//! The engine never touches real OS input. Scripts enqueue [`InputEvent`]s;
//! the engine merges them into a [`SimulatedInput`] snapshot at the start
//! of each host frame, and that snapshot is the only input the host's
//! widget code ever reads.
//!
//! # Design Notes
//!
//! - Events carry the minimum payload to reconstruct one primitive input.
//! - The snapshot tracks previous-frame button/key state so widget code
//!   can detect press/release edges without extra bookkeeping.
//! - Characters typed are a per-frame buffer, cleared on every frame.

use bitflags::bitflags;

use crate::geometry::Pos;

/// A queued synthetic input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Teleport the simulated mouse to an absolute position.
    MouseMoveTo(Pos),
    /// Press a mouse button.
    MouseButtonDown(MouseButton),
    /// Release a mouse button.
    MouseButtonUp(MouseButton),
    /// Press a key with the given modifiers.
    KeyDown(Key, Modifiers),
    /// Release a key.
    KeyUp(Key, Modifiers),
    /// A character of text input.
    Char(char),
}

/// Mouse buttons a host is expected to distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Middle/wheel button.
    Middle,
}

impl MouseButton {
    pub(crate) const COUNT: usize = 3;

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
            Self::Middle => 2,
        }
    }
}

/// Key codes for synthetic keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A regular character key.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Escape key.
    Escape,
    /// Tab key.
    Tab,
    /// Backspace key.
    Backspace,
    /// Delete key.
    Delete,
    /// Space bar.
    Space,
    /// Home key.
    Home,
    /// End key.
    End,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
}

bitflags! {
    /// Modifier keys held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Control key.
        const CTRL = 1 << 0;
        /// Alt/Option key.
        const ALT = 1 << 1;
        /// Shift key.
        const SHIFT = 1 << 2;
        /// Super/Cmd/Win key.
        const SUPER = 1 << 3;
    }
}

/// The merged input state one host frame sees.
///
/// Updated exclusively by the engine's pre-frame input drain; read
/// exclusively by host widget code during the frame. Ownership alternates
/// at the yield boundary, so no synchronization is needed.
#[derive(Debug, Clone, Default)]
pub struct SimulatedInput {
    /// Current mouse position.
    pub mouse_pos: Pos,
    buttons: [bool; MouseButton::COUNT],
    buttons_prev: [bool; MouseButton::COUNT],
    keys: Vec<Key>,
    keys_prev: Vec<Key>,
    /// Modifiers currently held.
    pub modifiers: Modifiers,
    /// Characters typed this frame. Cleared every frame.
    pub chars: Vec<char>,
}

impl SimulatedInput {
    /// Create an empty snapshot with the mouse parked at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Roll per-frame state forward: current button/key state becomes the
    /// previous-frame state and the char buffer empties. Called by the
    /// engine once per host tick, before draining the input queue.
    pub fn begin_frame(&mut self) {
        self.buttons_prev = self.buttons;
        self.keys_prev.clone_from(&self.keys);
        self.chars.clear();
    }

    /// Whether `button` is currently held down.
    #[must_use]
    pub fn is_down(&self, button: MouseButton) -> bool {
        self.buttons[button.index()]
    }

    /// Whether `button` went down this frame (press edge).
    #[must_use]
    pub fn pressed(&self, button: MouseButton) -> bool {
        self.buttons[button.index()] && !self.buttons_prev[button.index()]
    }

    /// Whether `button` came up this frame (release edge).
    #[must_use]
    pub fn released(&self, button: MouseButton) -> bool {
        !self.buttons[button.index()] && self.buttons_prev[button.index()]
    }

    /// Whether `key` is currently held down.
    #[must_use]
    pub fn key_down(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    /// Whether `key` went down this frame (press edge).
    #[must_use]
    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys.contains(&key) && !self.keys_prev.contains(&key)
    }

    /// Set a button's held state. Returns `false` when the event would be
    /// a no-op (the button is already in that state).
    pub fn set_button(&mut self, button: MouseButton, down: bool) -> bool {
        let slot = &mut self.buttons[button.index()];
        if *slot == down {
            return false;
        }
        *slot = down;
        true
    }

    /// Set a key's held state. Returns `false` on a no-op.
    pub fn set_key(&mut self, key: Key, down: bool) -> bool {
        let held = self.keys.contains(&key);
        if down == held {
            return false;
        }
        if down {
            self.keys.push(key);
        } else {
            self.keys.retain(|k| *k != key);
        }
        true
    }

    /// Whether this button or key already changed state this frame.
    ///
    /// Used by the input queue to bound how much of the FIFO one frame may
    /// consume: a second state change of the same control must wait for
    /// the next frame so a one-event-per-frame host registers both edges.
    #[must_use]
    pub fn toggled_this_frame(&self, event: &InputEvent) -> bool {
        match event {
            InputEvent::MouseButtonDown(b) | InputEvent::MouseButtonUp(b) => {
                self.buttons[b.index()] != self.buttons_prev[b.index()]
            }
            InputEvent::KeyDown(k, _) | InputEvent::KeyUp(k, _) => {
                self.keys.contains(k) != self.keys_prev.contains(k)
            }
            InputEvent::MouseMoveTo(_) | InputEvent::Char(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_edge_lasts_one_frame() {
        let mut sim = SimulatedInput::new();
        sim.begin_frame();
        assert!(sim.set_button(MouseButton::Left, true));
        assert!(sim.pressed(MouseButton::Left));
        assert!(sim.is_down(MouseButton::Left));

        sim.begin_frame();
        assert!(!sim.pressed(MouseButton::Left));
        assert!(sim.is_down(MouseButton::Left));
    }

    #[test]
    fn release_edge_detected() {
        let mut sim = SimulatedInput::new();
        sim.begin_frame();
        sim.set_button(MouseButton::Left, true);
        sim.begin_frame();
        sim.set_button(MouseButton::Left, false);
        assert!(sim.released(MouseButton::Left));
        assert!(!sim.is_down(MouseButton::Left));
    }

    #[test]
    fn redundant_button_event_is_noop() {
        let mut sim = SimulatedInput::new();
        sim.begin_frame();
        assert!(sim.set_button(MouseButton::Left, true));
        assert!(!sim.set_button(MouseButton::Left, true));
    }

    #[test]
    fn key_edges_track_like_buttons() {
        let mut sim = SimulatedInput::new();
        sim.begin_frame();
        sim.set_key(Key::Enter, true);
        assert!(sim.key_pressed(Key::Enter));
        sim.begin_frame();
        assert!(!sim.key_pressed(Key::Enter));
        assert!(sim.key_down(Key::Enter));
    }

    #[test]
    fn chars_clear_each_frame() {
        let mut sim = SimulatedInput::new();
        sim.chars.push('a');
        sim.begin_frame();
        assert!(sim.chars.is_empty());
    }

    #[test]
    fn toggled_this_frame_blocks_second_edge() {
        let mut sim = SimulatedInput::new();
        sim.begin_frame();
        sim.set_button(MouseButton::Left, true);
        let up = InputEvent::MouseButtonUp(MouseButton::Left);
        assert!(sim.toggled_this_frame(&up));

        sim.begin_frame();
        assert!(!sim.toggled_this_frame(&up));
    }
}
