#![forbid(unsafe_code)]

//! The standard two-window fixture the end-to-end suites drive.
//!
//! Layout:
//!
//! ```text
//! Main                      Tools
//! ├── Go                    ├── Payload   (drag source)
//! ├── Enable                ├── Bin       (drop target)
//! ├── Settings              └── Go        (duplicate label)
//! │   ├── Autosave
//! │   └── Advanced
//! │       └── Reset
//! ├── Name                  (text input)
//! └── Row 0 .. Row 11       (overflow the content area)
//! ```
//!
//! "Go" exists in both windows on purpose: wildcard lookups must pick the
//! first in draw order and warn about the other.

use std::cell::RefCell;
use std::rc::Rc;

use uiprobe_core::{ItemId, Rect, child_id, path_id};
use uiprobe_engine::{GuiFrame, TestEngine};

use crate::state::{HarnessWindowOps, UiState};
use crate::ui::Ui;

/// Rows appended at the bottom of Main to force scrolling.
pub const OVERFLOW_ROWS: usize = 12;

/// Shared handle to the fixture's retained state plus id helpers.
#[derive(Clone)]
pub struct DemoApp {
    /// Retained widget state, shared with the GUI callback and hooks.
    pub state: Rc<RefCell<UiState>>,
}

impl DemoApp {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: UiState::shared(),
        }
    }

    /// Wire this fixture's window hooks into an engine.
    pub fn install(&self, engine: &mut TestEngine) {
        engine.set_window_ops(HarnessWindowOps::new(self.state.clone()));
    }

    /// The fixture's GUI callback. Clone one per registered test.
    pub fn gui(&self) -> impl FnMut(&mut GuiFrame<'_>) + 'static {
        let state = self.state.clone();
        move |frame: &mut GuiFrame<'_>| {
            let mut state = state.borrow_mut();
            let mut ui = Ui::begin(frame, &mut state);
            ui.window("Main", Rect::new(0.0, 0.0, 220.0, 150.0), |w| {
                w.button("Go");
                w.checkbox("Enable");
                w.tree_node("Settings", |w| {
                    w.checkbox("Autosave");
                    w.tree_node("Advanced", |w| {
                        w.button("Reset");
                    });
                });
                w.text_input("Name");
                w.disabled(|w| {
                    w.button("Locked");
                });
                for row in 0..OVERFLOW_ROWS {
                    w.button(&format!("Row {row}"));
                }
            });
            ui.window("Tools", Rect::new(240.0, 0.0, 200.0, 120.0), |w| {
                w.drag_source("Payload");
                w.drop_target("Bin");
                w.button("Go");
            });
        }
    }

    // --- Id helpers -------------------------------------------------------

    #[must_use]
    pub fn main_window(&self) -> ItemId {
        child_id(ItemId::ROOT, "Main")
    }

    #[must_use]
    pub fn tools_window(&self) -> ItemId {
        child_id(ItemId::ROOT, "Tools")
    }

    #[must_use]
    pub fn go_button(&self) -> ItemId {
        path_id(ItemId::ROOT, "Main/Go")
    }

    #[must_use]
    pub fn enable_checkbox(&self) -> ItemId {
        path_id(ItemId::ROOT, "Main/Enable")
    }

    #[must_use]
    pub fn reset_button(&self) -> ItemId {
        path_id(ItemId::ROOT, "Main/Settings/Advanced/Reset")
    }

    #[must_use]
    pub fn name_input(&self) -> ItemId {
        path_id(ItemId::ROOT, "Main/Name")
    }

    #[must_use]
    pub fn payload(&self) -> ItemId {
        path_id(ItemId::ROOT, "Tools/Payload")
    }

    #[must_use]
    pub fn bin(&self) -> ItemId {
        path_id(ItemId::ROOT, "Tools/Bin")
    }

    #[must_use]
    pub fn row_button(&self, row: usize) -> ItemId {
        path_id(ItemId::ROOT, &format!("Main/Row {row}"))
    }
}

impl Default for DemoApp {
    fn default() -> Self {
        Self::new()
    }
}
