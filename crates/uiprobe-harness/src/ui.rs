#![forbid(unsafe_code)]

//! A minimal immediate-mode widget kit over the engine's `GuiFrame`.
//!
//! This is the reference host: enough widget behavior (windows with
//! z-order and scrolling, buttons, checkboxes, tree nodes, text inputs,
//! drag sources and drop targets) to exercise every engine action against
//! a GUI that behaves like a real one. Widgets are declared every frame;
//! retained state lives in [`UiState`].
//!
//! Interaction model, one frame at a time:
//! - the pointer belongs to the topmost window under the mouse;
//! - press edges focus that window, release edges activate widgets;
//! - a widget clipped out of its window's content area is reported with
//!   the visible flag cleared and never hovers;
//! - the item holding the engine's navigation focus also activates on an
//!   Enter press edge.

use uiprobe_core::{ItemId, Key, MouseButton, Pos, Rect, child_id};
use uiprobe_engine::{GuiFrame, ItemReport, ItemStatusFlags};

use crate::state::{UiState, WindowState};

/// Height of one widget row.
pub const ROW_HEIGHT: f32 = 14.0;
/// Gap between rows.
pub const ROW_GAP: f32 = 2.0;
/// Height of a window's title bar; content starts below it.
pub const TITLE_HEIGHT: f32 = 20.0;
/// Horizontal indent per tree level.
pub const INDENT: f32 = 12.0;

/// One frame's widget-kit pass. Create with [`Ui::begin`] inside the
/// test's GUI callback, declare windows and widgets, then drop it.
pub struct Ui<'u, 'f> {
    frame: &'u mut GuiFrame<'f>,
    state: &'u mut UiState,
    mouse: Pos,
    pressed: bool,
    released: bool,
    enter_pressed: bool,
    pointer_window: ItemId,
    // current window context
    window: ItemId,
    window_rect: Rect,
    cursor_y: f32,
    indent_x: f32,
    parent: ItemId,
    disabled: bool,
}

impl<'u, 'f> Ui<'u, 'f> {
    /// Start a widget pass for this frame.
    pub fn begin(frame: &'u mut GuiFrame<'f>, state: &'u mut UiState) -> Self {
        let input = frame.input();
        let mouse = input.mouse_pos;
        let pressed = input.pressed(MouseButton::Left);
        let released = input.released(MouseButton::Left);
        let enter_pressed = input.key_pressed(Key::Enter);

        // A drag whose release was already seen last frame is over.
        if state.drag.is_some() && !input.is_down(MouseButton::Left) && !released {
            state.drag = None;
        }

        let pointer_window = state
            .windows
            .iter()
            .filter(|(_, w)| w.rect.contains(mouse))
            .max_by_key(|(_, w)| w.z)
            .map(|(id, _)| *id)
            .unwrap_or(ItemId::ROOT);

        Self {
            frame,
            state,
            mouse,
            pressed,
            released,
            enter_pressed,
            pointer_window,
            window: ItemId::ROOT,
            window_rect: Rect::default(),
            cursor_y: 0.0,
            indent_x: 0.0,
            parent: ItemId::ROOT,
            disabled: false,
        }
    }

    /// Declare a window; `default_rect` places it the first time only.
    /// Widgets declared inside `body` stack vertically in its content
    /// area.
    pub fn window(&mut self, title: &str, default_rect: Rect, body: impl FnOnce(&mut Self)) {
        let id = child_id(ItemId::ROOT, title);
        if !self.state.windows.contains_key(&id) {
            let z = self.state.bump_z();
            self.state.windows.insert(
                id,
                WindowState {
                    rect: default_rect,
                    scroll_y: 0.0,
                    z,
                    pending_scroll: None,
                },
            );
            if self.state.focused_window.is_none() {
                self.state.focused_window = Some(id);
            }
        }

        // Any press inside the window focuses and raises it.
        if self.pressed && self.pointer_window == id {
            self.state.focus_window(id);
        }

        let (rect, scroll_y) = {
            // Entry is guaranteed above.
            let Some(w) = self.state.windows.get_mut(&id) else {
                return;
            };
            if let Some(target) = w.pending_scroll.take() {
                // The target rect is in last frame's screen coordinates;
                // shift scroll so it lands at the top of the content area.
                let content_top = w.rect.y + TITLE_HEIGHT;
                w.scroll_y = (w.scroll_y + (target.y - content_top)).max(0.0);
            }
            (w.rect, w.scroll_y)
        };

        let mut flags = ItemStatusFlags::VISIBLE;
        if self.state.focused_window == Some(id) {
            flags |= ItemStatusFlags::FOCUSED;
        }
        if self.pointer_window == id {
            flags |= ItemStatusFlags::HOVERED;
        }
        self.frame.report(ItemReport {
            id,
            parent: ItemId::ROOT,
            window: id,
            label: title.to_owned(),
            rect,
            flags,
        });

        let saved = (
            self.window,
            self.window_rect,
            self.cursor_y,
            self.indent_x,
            self.parent,
        );
        self.window = id;
        self.window_rect = rect;
        self.cursor_y = rect.y + TITLE_HEIGHT - scroll_y;
        self.indent_x = rect.x + 4.0;
        self.parent = id;
        body(self);
        (self.window, self.window_rect, self.cursor_y, self.indent_x, self.parent) = saved;
    }

    /// Mark widgets declared inside `body` as disabled: they render and
    /// report, but never hover or activate.
    pub fn disabled(&mut self, body: impl FnOnce(&mut Self)) {
        let saved = self.disabled;
        self.disabled = true;
        body(self);
        self.disabled = saved;
    }

    /// A plain, non-interactive row of text.
    pub fn label(&mut self, text: &str) {
        let (id, rect, visible, _, _) = self.row(text);
        let mut flags = ItemStatusFlags::empty();
        if visible {
            flags |= ItemStatusFlags::VISIBLE;
        }
        self.report(id, text, rect, flags);
    }

    /// A push button. Returns `true` on the frame it activates.
    pub fn button(&mut self, label: &str) -> bool {
        let (id, rect, visible, hovered, activated) = self.row(label);
        if activated {
            *self.state.clicks.entry(id).or_insert(0) += 1;
        }
        self.report(id, label, rect, self.interactive_flags(id, visible, hovered));
        activated
    }

    /// A checkbox. Returns the value after this frame.
    pub fn checkbox(&mut self, label: &str) -> bool {
        let (id, rect, visible, hovered, activated) = self.row(label);
        let value = self.state.checked.entry(id).or_insert(false);
        if activated {
            *value = !*value;
        }
        let value = *value;
        let mut flags = self.interactive_flags(id, visible, hovered) | ItemStatusFlags::CHECKABLE;
        if value {
            flags |= ItemStatusFlags::CHECKED;
        }
        self.report(id, label, rect, flags);
        value
    }

    /// A collapsible tree node; `body` runs only while it is open.
    /// Children nest under the node's id, one indent level deeper.
    pub fn tree_node(&mut self, label: &str, body: impl FnOnce(&mut Self)) {
        let (id, rect, visible, hovered, activated) = self.row(label);
        let open = self.state.opened.entry(id).or_insert(false);
        if activated {
            *open = !*open;
        }
        let open = *open;
        let mut flags = self.interactive_flags(id, visible, hovered) | ItemStatusFlags::OPENABLE;
        if open {
            flags |= ItemStatusFlags::OPENED;
        }
        self.report(id, label, rect, flags);
        if open {
            let saved = (self.parent, self.indent_x);
            self.parent = id;
            self.indent_x += INDENT;
            body(self);
            (self.parent, self.indent_x) = saved;
        }
    }

    /// A single-line text input. Activating it takes keyboard focus;
    /// typed characters append, Backspace deletes, Enter commits and
    /// drops focus. Returns the buffer after this frame.
    pub fn text_input(&mut self, label: &str) -> String {
        let (id, rect, visible, hovered, activated) = self.row(label);
        if activated {
            self.state.active_input = Some(id);
        }
        if self.state.active_input == Some(id) {
            let chars: Vec<char> = self.frame.input().chars.clone();
            let backspace = self.frame.input().key_pressed(Key::Backspace);
            let commit = self.frame.input().key_pressed(Key::Enter) && !activated;
            let buffer = self.state.texts.entry(id).or_default();
            buffer.extend(chars);
            if backspace {
                buffer.pop();
            }
            if commit {
                self.state.active_input = None;
            }
        }
        let mut flags = self.interactive_flags(id, visible, hovered);
        if self.state.active_input == Some(id) {
            flags |= ItemStatusFlags::FOCUSED;
        }
        self.report(id, label, rect, flags);
        self.state.texts.get(&id).cloned().unwrap_or_default()
    }

    /// A drag source: pressing the left button over it starts a drag.
    pub fn drag_source(&mut self, label: &str) {
        let (id, rect, visible, hovered, _) = self.row(label);
        if hovered && self.pressed {
            self.state.drag = Some(id);
        }
        self.report(id, label, rect, self.interactive_flags(id, visible, hovered));
    }

    /// A drop target: releasing an in-flight drag over it records the
    /// (source, target) pair. Returns `true` on the frame a drop lands.
    pub fn drop_target(&mut self, label: &str) -> bool {
        let (id, rect, visible, hovered, _) = self.row(label);
        let mut dropped = false;
        if hovered && self.released {
            if let Some(src) = self.state.drag.take() {
                self.state.drops.push((src, id));
                dropped = true;
            }
        }
        self.report(id, label, rect, self.interactive_flags(id, visible, hovered));
        dropped
    }

    /// Stable id a widget with this label gets in the current context.
    #[must_use]
    pub fn id_for(&self, label: &str) -> ItemId {
        child_id(self.parent, label)
    }

    // --- Internals ---------------------------------------------------------

    /// Lay out one row: id, rect, visibility against the window's content
    /// area, hover, and whether it activated this frame.
    fn row(&mut self, label: &str) -> (ItemId, Rect, bool, bool, bool) {
        let id = child_id(self.parent, label);
        let rect = Rect::new(
            self.indent_x,
            self.cursor_y,
            (self.window_rect.x + self.window_rect.w - 4.0 - self.indent_x).max(1.0),
            ROW_HEIGHT,
        );
        self.cursor_y += ROW_HEIGHT + ROW_GAP;

        let content = Rect::new(
            self.window_rect.x,
            self.window_rect.y + TITLE_HEIGHT,
            self.window_rect.w,
            (self.window_rect.h - TITLE_HEIGHT).max(0.0),
        );
        let visible = content.contains_rect(rect);
        let hovered = !self.disabled
            && visible
            && self.pointer_window == self.window
            && rect.contains(self.mouse);
        let nav_focused = self.frame.nav_focus() == id;
        let activated =
            !self.disabled && ((hovered && self.released) || (nav_focused && self.enter_pressed));
        (id, rect, visible, hovered, activated)
    }

    fn interactive_flags(&self, id: ItemId, visible: bool, hovered: bool) -> ItemStatusFlags {
        let mut flags = ItemStatusFlags::empty();
        if visible {
            flags |= ItemStatusFlags::VISIBLE;
        }
        if hovered {
            flags |= ItemStatusFlags::HOVERED;
        }
        if self.disabled {
            flags |= ItemStatusFlags::DISABLED;
        }
        if self.frame.nav_focus() == id {
            flags |= ItemStatusFlags::FOCUSED;
        }
        flags
    }

    fn report(&mut self, id: ItemId, label: &str, rect: Rect, flags: ItemStatusFlags) {
        self.frame.report(ItemReport {
            id,
            parent: self.parent,
            window: self.window,
            label: label.to_owned(),
            rect,
            flags,
        });
    }
}
