#![forbid(unsafe_code)]

//! Host window primitives.
//!
//! The engine treats the host as opaque: it cannot scroll, focus, or move
//! anything itself. Hosts expose those services through [`WindowOps`] and
//! the action layer calls them as corrective sub-steps (bring a window to
//! front before clicking into it, scroll an item into view). Each method
//! returns whether the host accepted the request; the effect is expected
//! to be observable in the registry on the following frame.

use uiprobe_core::{ItemId, Pos, Rect};

/// Window services the host exposes to the action layer.
pub trait WindowOps {
    /// Give keyboard/navigation focus to the window.
    fn focus_window(&mut self, window: ItemId) -> bool {
        let _ = window;
        true
    }

    /// Raise the window above its siblings.
    fn bring_to_front(&mut self, window: ItemId) -> bool {
        let _ = window;
        true
    }

    /// Scroll the window so `target` becomes visible.
    fn scroll_to(&mut self, window: ItemId, target: Rect) -> bool {
        let _ = (window, target);
        true
    }

    /// Move the window's top-left corner.
    fn move_window(&mut self, window: ItemId, pos: Pos) -> bool {
        let _ = (window, pos);
        true
    }

    /// Resize the window.
    fn resize_window(&mut self, window: ItemId, size: Pos) -> bool {
        let _ = (window, size);
        true
    }
}

/// No-op host: every request is accepted and nothing moves. Suitable for
/// hosts without windows (single fixed surface).
#[derive(Debug, Default)]
pub struct NullWindowOps;

impl WindowOps for NullWindowOps {}
