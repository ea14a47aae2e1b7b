#![forbid(unsafe_code)]

//! The per-frame handle host widget code draws through.
//!
//! Every frame a test is active, the engine calls the test's GUI callback
//! with a [`GuiFrame`]. The callback reads the simulated input snapshot,
//! draws its widgets however it likes, and reports each interactive item
//! into the registry. The engine never renders anything itself.

use std::any::Any;

use uiprobe_core::{ItemId, SimulatedInput};

use crate::registry::{ItemRegistry, ItemReport};

/// One frame's drawing context, passed to the test's GUI callback.
pub struct GuiFrame<'a> {
    pub(crate) registry: &'a mut ItemRegistry,
    pub(crate) input: &'a SimulatedInput,
    pub(crate) frame: u64,
    pub(crate) dt: f32,
    pub(crate) nav_focus: ItemId,
    pub(crate) vars: &'a mut Option<Box<dyn Any>>,
}

impl GuiFrame<'_> {
    /// The simulated input snapshot for this frame. This is the only
    /// input the frame sees.
    #[must_use]
    pub fn input(&self) -> &SimulatedInput {
        self.input
    }

    /// Engine frame number.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Delta time of this frame, in seconds.
    #[must_use]
    pub fn delta_time(&self) -> f32 {
        self.dt
    }

    /// The item currently holding synthetic navigation focus, or
    /// [`ItemId::ROOT`] when none.
    #[must_use]
    pub fn nav_focus(&self) -> ItemId {
        self.nav_focus
    }

    /// Report one drawn item into the registry.
    pub fn report(&mut self, report: ItemReport) {
        self.registry.report(report);
    }

    /// Access the test's user-data blob, if the script installed one of
    /// type `T`. The borrow is scoped to the closure.
    pub fn with_vars<T: 'static, R>(&mut self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.vars
            .as_mut()
            .and_then(|blob| blob.downcast_mut::<T>())
            .map(f)
    }
}
