#![forbid(unsafe_code)]

//! Action layer: compound interactions spanning multiple frames.
//!
//! One logical action (click, check, drag) becomes a short state machine
//! of input-queue writes and frame yields: locate the target, make it
//! interactable (focus its window, scroll it into view), move the mouse,
//! emit the button edges across frames, then re-locate and verify the
//! post-condition. Corrective sub-actions nest; an action-depth counter
//! with a hard ceiling turns runaway recursion into an authoring failure
//! instead of silent looping.

use std::rc::Rc;

use tracing::debug;
use uiprobe_core::{InputEvent, Key, Modifiers, MouseButton, Pos, TestRef};

use crate::context::TestCtx;
use crate::error::{TestError, TestResult};
use crate::registry::{ItemInfo, ItemStatusFlags};
use crate::sched::TestRunState;

/// The action kinds the item-action dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Single left click.
    Click,
    /// Two left clicks inside the double-click window.
    DoubleClick,
    /// Click a checkable item until checked; verified.
    Check,
    /// Click a checkable item until unchecked; verified.
    Uncheck,
    /// Click an openable item until opened; verified.
    Open,
    /// Click an openable item until closed; verified.
    Close,
    /// Click a text field to give it input focus.
    Input,
    /// Activate via navigation (focus + Enter) instead of the mouse.
    NavActivate,
}

impl Action {
    /// Action name for diagnostics and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Click => "Click",
            Self::DoubleClick => "DoubleClick",
            Self::Check => "Check",
            Self::Uncheck => "Uncheck",
            Self::Open => "Open",
            Self::Close => "Close",
            Self::Input => "Input",
            Self::NavActivate => "NavActivate",
        }
    }

    /// The status flag this action toggles and the value it must end at,
    /// when the action carries a verified post-condition.
    const fn verify_target(&self) -> Option<(ItemStatusFlags, bool)> {
        match self {
            Self::Check => Some((ItemStatusFlags::CHECKED, true)),
            Self::Uncheck => Some((ItemStatusFlags::CHECKED, false)),
            Self::Open => Some((ItemStatusFlags::OPENED, true)),
            Self::Close => Some((ItemStatusFlags::OPENED, false)),
            _ => None,
        }
    }

    /// Whether the action is already satisfied by the item's state, in
    /// which case it is a verified no-op success (idempotence).
    fn already_satisfied(&self, item: &ItemInfo) -> bool {
        match self.verify_target() {
            Some((flag, expected)) => item.flags.contains(flag) == expected,
            None => false,
        }
    }

    /// The capability flag an item must report for this action.
    const fn required_capability(&self) -> Option<ItemStatusFlags> {
        match self {
            Self::Check | Self::Uncheck => Some(ItemStatusFlags::CHECKABLE),
            Self::Open | Self::Close => Some(ItemStatusFlags::OPENABLE),
            _ => None,
        }
    }
}

/// Decrements the run's action depth when a compound action unwinds.
struct DepthGuard {
    run: Rc<std::cell::RefCell<TestRunState>>,
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        let mut run = self.run.borrow_mut();
        run.action_depth = run.action_depth.saturating_sub(1);
    }
}

impl TestCtx {
    fn push_depth(&self) -> TestResult<DepthGuard> {
        let ceiling = self.shared.borrow().config.action_depth_max;
        let mut run = self.run.borrow_mut();
        if run.action_depth >= ceiling {
            drop(run);
            return self.fail(TestError::authoring(format!(
                "action depth ceiling ({ceiling}) hit; corrective sub-actions are recursing"
            )));
        }
        run.action_depth += 1;
        drop(run);
        Ok(DepthGuard {
            run: self.run.clone(),
        })
    }

    /// Enqueue one synthetic input event for the coming frames.
    pub fn enqueue(&self, event: InputEvent) {
        self.shared.borrow_mut().queue.push(event);
    }

    /// Refuse to start new input once the run has failed. Without this a
    /// primitive would enqueue its edge pair, have its yields cut short
    /// by the error, and return `Ok` with the edges still queued.
    fn bail_if_error(&self) -> TestResult<()> {
        if self.aborted() {
            return Err(TestError::Aborted);
        }
        match self.run.borrow().first_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    // --- Mouse primitives --------------------------------------------------

    /// Move the simulated mouse to an absolute position. Teleports in one
    /// frame when `run_fast` is set; otherwise paces travel at the
    /// configured speed across as many frames as needed.
    pub async fn mouse_move_to_pos(&self, target: Pos) -> TestResult<()> {
        self.bail_if_error()?;
        let (run_fast, speed, budget) = {
            let shared = self.shared.borrow();
            (
                shared.config.run_fast,
                shared.config.mouse_speed,
                shared.config.wait_budget_frames().saturating_mul(4).max(1),
            )
        };
        if run_fast {
            self.enqueue(InputEvent::MouseMoveTo(target));
            self.yield_frame().await;
            return Ok(());
        }
        let mut travelled = 0_u64;
        loop {
            if self.aborted() {
                return Err(TestError::Aborted);
            }
            let (current, dt) = {
                let shared = self.shared.borrow();
                (shared.sim.mouse_pos, shared.config.fixed_dt.max(shared.last_dt))
            };
            let distance = current.distance(target);
            let step = (speed * dt).max(1.0);
            if distance <= step {
                self.enqueue(InputEvent::MouseMoveTo(target));
                self.yield_frame().await;
                return Ok(());
            }
            self.enqueue(InputEvent::MouseMoveTo(current.lerp(target, step / distance)));
            self.yield_frame().await;
            travelled += 1;
            if travelled >= budget {
                return self.fail(TestError::timeout("mouse travel", travelled));
            }
        }
    }

    /// Move the mouse over an item's interaction point (rect center),
    /// making it interactable first.
    pub async fn mouse_move(&self, r: impl Into<TestRef>) -> TestResult<()> {
        let _depth = self.push_depth()?;
        let item = self.item_locate(r.into()).await?;
        let item = self.ensure_interactable(item).await?;
        self.mouse_move_to_pos(item.rect.center()).await
    }

    /// Press and release a button; the edges land on consecutive frames.
    pub async fn mouse_click(&self, button: MouseButton) -> TestResult<()> {
        self.bail_if_error()?;
        self.enqueue(InputEvent::MouseButtonDown(button));
        self.enqueue(InputEvent::MouseButtonUp(button));
        self.yield_frames(2).await;
        Ok(())
    }

    /// Two clicks back-to-back, inside the host's double-click window.
    pub async fn mouse_double_click(&self, button: MouseButton) -> TestResult<()> {
        self.bail_if_error()?;
        for _ in 0..2 {
            self.enqueue(InputEvent::MouseButtonDown(button));
            self.enqueue(InputEvent::MouseButtonUp(button));
        }
        self.yield_frames(4).await;
        Ok(())
    }

    /// Press a button and leave it held.
    pub async fn mouse_down(&self, button: MouseButton) -> TestResult<()> {
        self.bail_if_error()?;
        self.enqueue(InputEvent::MouseButtonDown(button));
        self.yield_frame().await;
        Ok(())
    }

    /// Release a held button. Always goes through, even on a failed run,
    /// so a button can never be left stuck down.
    pub async fn mouse_up(&self, button: MouseButton) -> TestResult<()> {
        self.enqueue(InputEvent::MouseButtonUp(button));
        self.yield_frame().await;
        Ok(())
    }

    // --- Keyboard primitives -----------------------------------------------

    /// Press and release a key; the edges land on consecutive frames.
    pub async fn key_press(&self, key: Key, mods: Modifiers) -> TestResult<()> {
        self.bail_if_error()?;
        self.enqueue(InputEvent::KeyDown(key, mods));
        self.enqueue(InputEvent::KeyUp(key, mods));
        self.yield_frames(2).await;
        Ok(())
    }

    /// Type a string of characters into whatever holds input focus.
    pub async fn key_chars(&self, text: &str) -> TestResult<()> {
        self.bail_if_error()?;
        for c in text.chars() {
            self.enqueue(InputEvent::Char(c));
        }
        self.yield_frame().await;
        Ok(())
    }

    /// Type a string then press Enter.
    pub async fn key_chars_append_enter(&self, text: &str) -> TestResult<()> {
        self.key_chars(text).await?;
        self.key_press(Key::Enter, Modifiers::empty()).await
    }

    // --- Navigation --------------------------------------------------------

    /// Point synthetic navigation focus at an item.
    pub async fn nav_move(&self, r: impl Into<TestRef>) -> TestResult<()> {
        let r = r.into();
        let item = self.item_locate(r.clone()).await?;
        self.shared.borrow_mut().nav_focus = item.id;
        self.yield_frame().await;
        let after = self.item_locate_with_budget(item.id, 2).await?;
        if !after.flags.contains(ItemStatusFlags::FOCUSED) {
            return self.fail(TestError::action(
                "NavMove",
                self.describe_ref(&r),
                "item did not take navigation focus",
            ));
        }
        Ok(())
    }

    /// Activate whatever holds navigation focus (Enter).
    pub async fn nav_activate(&self) -> TestResult<()> {
        self.key_press(Key::Enter, Modifiers::empty()).await
    }

    // --- Item actions ------------------------------------------------------

    /// Apply one compound action to a target reference.
    pub async fn item_action(&self, action: Action, r: impl Into<TestRef>) -> TestResult<()> {
        let r = r.into();
        let _depth = self.push_depth()?;
        debug!(test = %self.test_name, action = action.name(), target = %self.describe_ref(&r), "item_action");

        let item = self.item_locate(r.clone()).await?;
        if item.flags.contains(ItemStatusFlags::DISABLED) {
            return self.fail(TestError::action(
                action.name(),
                self.describe_ref(&r),
                "item is disabled",
            ));
        }
        if let Some(capability) = action.required_capability() {
            if !item.flags.contains(capability) {
                return self.fail(TestError::action(
                    action.name(),
                    self.describe_ref(&r),
                    format!("item does not support {}", action.name()),
                ));
            }
        }
        if action.already_satisfied(&item) {
            self.log_debug(format!(
                "{} '{}': already in target state, no-op",
                action.name(),
                self.describe_ref(&r)
            ));
            return Ok(());
        }

        let item = self.ensure_interactable(item).await?;
        let before = item.flags;

        match action {
            Action::Click | Action::Check | Action::Uncheck | Action::Open | Action::Close => {
                self.mouse_move_to_pos(item.rect.center()).await?;
                self.mouse_click(MouseButton::Left).await?;
            }
            Action::DoubleClick => {
                self.mouse_move_to_pos(item.rect.center()).await?;
                self.mouse_double_click(MouseButton::Left).await?;
            }
            Action::Input => {
                self.mouse_move_to_pos(item.rect.center()).await?;
                self.mouse_click(MouseButton::Left).await?;
            }
            Action::NavActivate => {
                self.shared.borrow_mut().nav_focus = item.id;
                self.yield_frame().await;
                self.nav_activate().await?;
            }
        }

        if let Some((flag, expected)) = action.verify_target() {
            self.yield_frame().await;
            // The act may legitimately remove the item (closing a node
            // can reflow its subtree); only verify when it is still alive.
            if let Some(after) = self.item_info(item.id) {
                if after.flags.contains(flag) != expected {
                    return self.fail(TestError::action(
                        action.name(),
                        self.describe_ref(&r),
                        format!(
                            "post-condition mismatch: before {:?}, after {:?}, expected {:?}={}",
                            before, after.flags, flag, expected
                        ),
                    ));
                }
            } else {
                self.log_debug(format!(
                    "{} '{}': item gone after action, skipping verify",
                    action.name(),
                    self.describe_ref(&r)
                ));
            }
        }
        Ok(())
    }

    /// Click an item.
    pub async fn item_click(&self, r: impl Into<TestRef>) -> TestResult<()> {
        self.item_action(Action::Click, r).await
    }

    /// Double-click an item.
    pub async fn item_double_click(&self, r: impl Into<TestRef>) -> TestResult<()> {
        self.item_action(Action::DoubleClick, r).await
    }

    /// Check a checkable item; verified, idempotent.
    pub async fn item_check(&self, r: impl Into<TestRef>) -> TestResult<()> {
        self.item_action(Action::Check, r).await
    }

    /// Uncheck a checkable item; verified, idempotent.
    pub async fn item_uncheck(&self, r: impl Into<TestRef>) -> TestResult<()> {
        self.item_action(Action::Uncheck, r).await
    }

    /// Open an openable item; verified, idempotent.
    pub async fn item_open(&self, r: impl Into<TestRef>) -> TestResult<()> {
        self.item_action(Action::Open, r).await
    }

    /// Close an openable item; verified, idempotent.
    pub async fn item_close(&self, r: impl Into<TestRef>) -> TestResult<()> {
        self.item_action(Action::Close, r).await
    }

    /// Focus a text field and type into it, ending with Enter.
    pub async fn item_input(&self, r: impl Into<TestRef>, text: &str) -> TestResult<()> {
        self.item_action(Action::Input, r).await?;
        self.key_chars_append_enter(text).await
    }

    /// Activate an item through navigation instead of the mouse.
    pub async fn item_nav_activate(&self, r: impl Into<TestRef>) -> TestResult<()> {
        self.item_action(Action::NavActivate, r).await
    }

    /// Hold the mouse button down on an item for a stretch of simulated
    /// time.
    pub async fn item_hold(&self, r: impl Into<TestRef>, seconds: f32) -> TestResult<()> {
        let _depth = self.push_depth()?;
        let item = self.item_locate(r.into()).await?;
        let item = self.ensure_interactable(item).await?;
        self.mouse_move_to_pos(item.rect.center()).await?;
        self.mouse_down(MouseButton::Left).await?;
        self.sleep(seconds).await;
        self.mouse_up(MouseButton::Left).await
    }

    /// Apply an action to every item under `parent`, re-gathering after
    /// each pass because acting on one item can change which items exist.
    /// Bounded by the configured pass ceiling so structurally unstable
    /// trees still terminate.
    pub async fn item_action_all(
        &self,
        action: Action,
        parent: impl Into<TestRef>,
        depth: i32,
        passes: i32,
    ) -> TestResult<()> {
        let parent = parent.into();
        let _guard = self.push_depth()?;
        let max_passes = if passes < 0 {
            self.shared.borrow().config.action_all_max_passes
        } else {
            passes.unsigned_abs()
        };
        for pass in 0..max_passes {
            let items = self.gather_items(parent.clone(), depth).await?;
            let mut acted = 0_usize;
            for info in &items {
                // Earlier acts in this pass may have removed the item
                // (closing a node collapses its subtree); judge it by its
                // current-frame state, not the gather snapshot.
                let Some(live) = self.item_info(info.id) else {
                    continue;
                };
                if live.flags.contains(ItemStatusFlags::DISABLED)
                    || action.already_satisfied(&live)
                {
                    continue;
                }
                if let Some(capability) = action.required_capability() {
                    if !live.flags.contains(capability) {
                        continue;
                    }
                }
                self.item_action(action, TestRef::Id(live.id)).await?;
                acted += 1;
            }
            debug!(
                test = %self.test_name,
                action = action.name(),
                pass,
                acted,
                "item_action_all pass"
            );
            if acted == 0 {
                break;
            }
            // Non-structural actions cannot spawn new targets.
            if action.verify_target().is_none() {
                break;
            }
        }
        Ok(())
    }

    /// Open every openable item under `parent`.
    pub async fn item_open_all(&self, parent: impl Into<TestRef>, depth: i32) -> TestResult<()> {
        self.item_action_all(Action::Open, parent, depth, -1).await
    }

    /// Close every openable item under `parent`.
    pub async fn item_close_all(&self, parent: impl Into<TestRef>, depth: i32) -> TestResult<()> {
        self.item_action_all(Action::Close, parent, depth, -1).await
    }

    /// Drag one item onto another: press at the source, travel in steps
    /// so the host's drag threshold is exceeded, release at the
    /// destination. Every step yields.
    pub async fn item_drag_and_drop(
        &self,
        src: impl Into<TestRef>,
        dst: impl Into<TestRef>,
    ) -> TestResult<()> {
        let src = src.into();
        let dst = dst.into();
        let _depth = self.push_depth()?;
        let src_item = self.item_locate(src.clone()).await?;
        let dst_item = self.item_locate(dst.clone()).await?;
        let src_item = self.ensure_interactable(src_item).await?;

        let from = src_item.rect.center();
        let to = dst_item.rect.center();
        self.mouse_move_to_pos(from).await?;
        self.mouse_down(MouseButton::Left).await?;

        let step_px = self.shared.borrow().config.drag_step_px.max(1.0);
        let distance = from.distance(to);
        let steps = (distance / step_px).ceil().max(1.0) as u32;
        for i in 1..=steps {
            if self.aborted() {
                return Err(TestError::Aborted);
            }
            let t = i as f32 / steps as f32;
            self.enqueue(InputEvent::MouseMoveTo(from.lerp(to, t)));
            self.yield_frame().await;
        }
        self.mouse_up(MouseButton::Left).await?;
        self.yield_frame().await;
        Ok(())
    }

    // --- Windows -----------------------------------------------------------

    /// Focus a window and raise it; verified against the registry.
    pub async fn window_focus(&self, r: impl Into<TestRef>) -> TestResult<()> {
        let r = r.into();
        let _depth = self.push_depth()?;
        let window = self.item_locate(r.clone()).await?;
        let accepted = {
            let mut shared = self.shared.borrow_mut();
            let raised = shared.window_ops.bring_to_front(window.id);
            shared.window_ops.focus_window(window.id) && raised
        };
        if !accepted {
            return self.fail(TestError::action(
                "WindowFocus",
                self.describe_ref(&r),
                "host rejected the focus request",
            ));
        }
        self.yield_frame().await;
        let after = self.item_locate_with_budget(window.id, 2).await?;
        if !after.flags.contains(ItemStatusFlags::FOCUSED) {
            return self.fail(TestError::action(
                "WindowFocus",
                self.describe_ref(&r),
                "window did not report focus after the request",
            ));
        }
        Ok(())
    }

    /// Move a window; verified by re-locating and comparing positions.
    pub async fn window_move(&self, r: impl Into<TestRef>, pos: Pos) -> TestResult<()> {
        let r = r.into();
        let _depth = self.push_depth()?;
        let window = self.item_locate(r.clone()).await?;
        if !self.shared.borrow_mut().window_ops.move_window(window.id, pos) {
            return self.fail(TestError::action(
                "WindowMove",
                self.describe_ref(&r),
                "host rejected the move request",
            ));
        }
        self.yield_frame().await;
        let after = self.item_locate_with_budget(window.id, 2).await?;
        if (after.rect.x - pos.x).abs() > 0.5 || (after.rect.y - pos.y).abs() > 0.5 {
            return self.fail(TestError::action(
                "WindowMove",
                self.describe_ref(&r),
                format!(
                    "expected top-left ({}, {}), got ({}, {})",
                    pos.x, pos.y, after.rect.x, after.rect.y
                ),
            ));
        }
        Ok(())
    }

    /// Resize a window; verified by re-locating and comparing sizes.
    pub async fn window_resize(&self, r: impl Into<TestRef>, size: Pos) -> TestResult<()> {
        let r = r.into();
        let _depth = self.push_depth()?;
        let window = self.item_locate(r.clone()).await?;
        if !self
            .shared
            .borrow_mut()
            .window_ops
            .resize_window(window.id, size)
        {
            return self.fail(TestError::action(
                "WindowResize",
                self.describe_ref(&r),
                "host rejected the resize request",
            ));
        }
        self.yield_frame().await;
        let after = self.item_locate_with_budget(window.id, 2).await?;
        if (after.rect.w - size.x).abs() > 0.5 || (after.rect.h - size.y).abs() > 0.5 {
            return self.fail(TestError::action(
                "WindowResize",
                self.describe_ref(&r),
                format!(
                    "expected size ({}, {}), got ({}, {})",
                    size.x, size.y, after.rect.w, after.rect.h
                ),
            ));
        }
        Ok(())
    }

    // --- Corrective steps --------------------------------------------------

    /// Make an item interactable: focus its window when unfocused and
    /// scroll it into view when clipped. Each corrective step is itself
    /// bounded; the nested depth guard stops indefinite recursion. Returns
    /// a fresh `ItemInfo` for the current frame.
    async fn ensure_interactable(&self, item: ItemInfo) -> TestResult<ItemInfo> {
        let _depth = self.push_depth()?;
        let window_id = item.window;

        if !window_id.is_root() && window_id != item.id {
            let window_unfocused = self
                .item_info(window_id)
                .is_some_and(|w| !w.flags.contains(ItemStatusFlags::FOCUSED));
            if window_unfocused {
                self.window_focus(TestRef::Id(window_id)).await?;
            }
        }

        if !item.visible() {
            let accepted = self
                .shared
                .borrow_mut()
                .window_ops
                .scroll_to(window_id, item.rect);
            if !accepted {
                return self.fail(TestError::action(
                    "ScrollIntoView",
                    item.label.clone(),
                    "host rejected the scroll request",
                ));
            }
            let budget = self.shared.borrow().config.wait_budget_frames();
            let mut waited = 0_u64;
            loop {
                self.yield_frame().await;
                waited += 1;
                if let Some(fresh) = self.item_info(item.id) {
                    if fresh.visible() {
                        return Ok(fresh);
                    }
                }
                if waited >= budget {
                    return self.fail(TestError::timeout(
                        format!("'{}' to scroll into view", item.label),
                        waited,
                    ));
                }
            }
        }

        // Always hand back this frame's rect: the focus/scroll steps above
        // may have moved things.
        self.item_locate_with_budget(item.id, 2).await
    }
}
