#![forbid(unsafe_code)]

//! Persistent widget-kit state and the host-side window hooks.
//!
//! The widget kit is immediate-mode: widgets are re-declared every frame,
//! but toggles, text buffers, scroll offsets and window placement must
//! survive between frames. [`UiState`] is that retained store, shared
//! between the per-test GUI callback and the engine's window hooks via
//! `Rc<RefCell<_>>`.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use tracing::debug;
use uiprobe_core::{ItemId, Pos, Rect};
use uiprobe_engine::WindowOps;

/// Retained per-window state.
#[derive(Debug, Clone)]
pub struct WindowState {
    /// Screen placement.
    pub rect: Rect,
    /// Vertical content scroll, in pixels.
    pub scroll_y: f32,
    /// Stacking order; higher is closer to the viewer.
    pub z: u32,
    /// Scroll request from the engine, serviced at next layout.
    pub(crate) pending_scroll: Option<Rect>,
}

/// Retained widget-kit state, shared between GUI callback and hooks.
#[derive(Debug, Default)]
pub struct UiState {
    /// All windows ever declared, keyed by id.
    pub windows: AHashMap<ItemId, WindowState>,
    /// Checkbox values.
    pub checked: AHashMap<ItemId, bool>,
    /// Tree-node open values.
    pub opened: AHashMap<ItemId, bool>,
    /// Text-input buffers.
    pub texts: AHashMap<ItemId, String>,
    /// Activation counters, bumped on every button activation.
    pub clicks: AHashMap<ItemId, u32>,
    /// The text input currently consuming typed characters.
    pub active_input: Option<ItemId>,
    /// The window holding focus.
    pub focused_window: Option<ItemId>,
    /// In-flight drag source, if the left button went down on one.
    pub drag: Option<ItemId>,
    /// Completed (source, target) drops, in order.
    pub drops: Vec<(ItemId, ItemId)>,
    z_counter: u32,
}

impl UiState {
    /// Fresh state behind the shared handle the kit expects.
    #[must_use]
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Activation count of a button.
    #[must_use]
    pub fn click_count(&self, id: ItemId) -> u32 {
        self.clicks.get(&id).copied().unwrap_or(0)
    }

    /// Current checkbox value.
    #[must_use]
    pub fn is_checked(&self, id: ItemId) -> bool {
        self.checked.get(&id).copied().unwrap_or(false)
    }

    /// Current tree-node open value.
    #[must_use]
    pub fn is_opened(&self, id: ItemId) -> bool {
        self.opened.get(&id).copied().unwrap_or(false)
    }

    /// Current text-input buffer.
    #[must_use]
    pub fn text(&self, id: ItemId) -> &str {
        self.texts.get(&id).map_or("", String::as_str)
    }

    pub(crate) fn bump_z(&mut self) -> u32 {
        self.z_counter += 1;
        self.z_counter
    }

    /// Give a window focus and raise it. Returns `false` for unknown
    /// windows.
    pub fn focus_window(&mut self, id: ItemId) -> bool {
        let z = self.bump_z();
        match self.windows.get_mut(&id) {
            Some(window) => {
                window.z = z;
                self.focused_window = Some(id);
                true
            }
            None => false,
        }
    }
}

/// Window hooks backed by [`UiState`]: focus and raise take effect
/// immediately, scroll/move/resize are serviced at the window's next
/// layout.
pub struct HarnessWindowOps {
    state: Rc<RefCell<UiState>>,
}

impl HarnessWindowOps {
    #[must_use]
    pub fn new(state: Rc<RefCell<UiState>>) -> Self {
        Self { state }
    }
}

impl WindowOps for HarnessWindowOps {
    fn focus_window(&mut self, window: ItemId) -> bool {
        self.state.borrow_mut().focus_window(window)
    }

    fn bring_to_front(&mut self, window: ItemId) -> bool {
        self.state.borrow_mut().focus_window(window)
    }

    fn scroll_to(&mut self, window: ItemId, target: Rect) -> bool {
        let mut state = self.state.borrow_mut();
        match state.windows.get_mut(&window) {
            Some(w) => {
                debug!(%window, ?target, "scroll requested");
                w.pending_scroll = Some(target);
                true
            }
            None => false,
        }
    }

    fn move_window(&mut self, window: ItemId, pos: Pos) -> bool {
        let mut state = self.state.borrow_mut();
        match state.windows.get_mut(&window) {
            Some(w) => {
                w.rect.x = pos.x;
                w.rect.y = pos.y;
                true
            }
            None => false,
        }
    }

    fn resize_window(&mut self, window: ItemId, size: Pos) -> bool {
        let mut state = self.state.borrow_mut();
        match state.windows.get_mut(&window) {
            Some(w) => {
                w.rect.w = size.x;
                w.rect.h = size.y;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_raises_z() {
        let mut state = UiState::default();
        let a = ItemId(1);
        let b = ItemId(2);
        for id in [a, b] {
            let z = state.bump_z();
            state.windows.insert(
                id,
                WindowState {
                    rect: Rect::new(0.0, 0.0, 10.0, 10.0),
                    scroll_y: 0.0,
                    z,
                    pending_scroll: None,
                },
            );
        }
        assert!(state.focus_window(a));
        assert_eq!(state.focused_window, Some(a));
        assert!(state.windows[&a].z > state.windows[&b].z);
    }

    #[test]
    fn hooks_reject_unknown_windows() {
        let shared = UiState::shared();
        let mut ops = HarnessWindowOps::new(shared);
        assert!(!ops.focus_window(ItemId(42)));
        assert!(!ops.scroll_to(ItemId(42), Rect::default()));
    }
}
