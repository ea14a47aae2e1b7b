#![forbid(unsafe_code)]

//! End-to-end item actions against the standard fixture:
//! - a click activates its button exactly once
//! - check/uncheck are verified and idempotent
//! - open-all reaches nested nodes, close-all collapses them
//! - text input types, commits, and survives re-reading
//! - disabled items refuse actions
//! - drag-and-drop lands on the drop target
//! - navigation activation works without the mouse
//! - holding an item activates it exactly once, on release
//! - window move/resize round-trip through the host hooks and verify
//!
//! Run:
//!   cargo test -p uiprobe-harness --test e2e_item_actions

use uiprobe_engine::{EngineConfig, Pos, Rect, TestEngine, TestStatus};
use uiprobe_harness::DemoApp;

fn engine_with_app() -> (TestEngine, DemoApp) {
    let mut engine = TestEngine::new(EngineConfig {
        warmup_frames: 2,
        max_frames_per_test: 2_000,
        ..EngineConfig::default()
    });
    let app = DemoApp::new();
    app.install(&mut engine);
    (engine, app)
}

#[test]
fn click_activates_exactly_once() {
    let (mut engine, app) = engine_with_app();
    engine.register_test("actions", "single_click", app.gui(), |ctx| async move {
        ctx.set_ref("Main")?;
        ctx.item_click("Go").await?;
        Ok(())
    });
    engine.queue_test("single_click");
    engine.run_queue();

    assert_eq!(engine.status("single_click"), TestStatus::Success);
    assert_eq!(app.state.borrow().click_count(app.go_button()), 1);
}

#[test]
fn check_is_verified_and_idempotent() {
    let (mut engine, app) = engine_with_app();
    engine.register_test("actions", "check_twice", app.gui(), |ctx| async move {
        ctx.item_check("Main/Enable").await?;
        // Second check must be a no-op, not a toggle back to unchecked.
        ctx.item_check("Main/Enable").await?;
        ctx.item_uncheck("Main/Enable").await?;
        ctx.item_uncheck("Main/Enable").await?;
        ctx.item_check("Main/Enable").await?;
        Ok(())
    });
    engine.queue_test("check_twice");
    engine.run_queue();

    assert_eq!(engine.status("check_twice"), TestStatus::Success);
    assert!(app.state.borrow().is_checked(app.enable_checkbox()));
}

#[test]
fn open_all_reaches_nested_nodes() {
    let (mut engine, app) = engine_with_app();
    engine.register_test("actions", "open_all", app.gui(), |ctx| async move {
        ctx.item_open_all("Main", -1).await?;
        // Reset only exists once Settings and Advanced are both open.
        ctx.item_click("Main/Settings/Advanced/Reset").await?;
        ctx.item_close_all("Main", -1).await?;
        Ok(())
    });
    engine.queue_test("open_all");
    engine.run_queue();

    assert_eq!(engine.status("open_all"), TestStatus::Success);
    let state = app.state.borrow();
    assert_eq!(state.click_count(app.reset_button()), 1);
    assert!(!state.is_opened(uiprobe_engine::path_id(
        uiprobe_engine::ItemId::ROOT,
        "Main/Settings"
    )));
}

#[test]
fn text_input_types_and_commits() {
    let (mut engine, app) = engine_with_app();
    engine.register_test("actions", "type_name", app.gui(), |ctx| async move {
        ctx.item_input("Main/Name", "hello world").await?;
        Ok(())
    });
    engine.queue_test("type_name");
    engine.run_queue();

    assert_eq!(engine.status("type_name"), TestStatus::Success);
    let state = app.state.borrow();
    assert_eq!(state.text(app.name_input()), "hello world");
    // Enter committed: the input no longer holds keyboard focus.
    assert_eq!(state.active_input, None);
}

#[test]
fn disabled_items_refuse_actions() {
    let (mut engine, app) = engine_with_app();
    engine.register_test("actions", "click_locked", app.gui(), |ctx| async move {
        ctx.item_click("Main/Locked").await?;
        Ok(())
    });
    engine.queue_test("click_locked");
    engine.run_queue();

    assert_eq!(engine.status("click_locked"), TestStatus::Error);
    let record = &engine.records()[0];
    assert!(record.error.as_deref().is_some_and(|e| e.contains("disabled")));
}

#[test]
fn drag_and_drop_lands_on_target() {
    let (mut engine, app) = engine_with_app();
    engine.register_test("actions", "drag", app.gui(), |ctx| async move {
        ctx.item_drag_and_drop("Tools/Payload", "Tools/Bin").await?;
        Ok(())
    });
    engine.queue_test("drag");
    engine.run_queue();

    assert_eq!(engine.status("drag"), TestStatus::Success);
    let state = app.state.borrow();
    assert_eq!(state.drops.as_slice(), &[(app.payload(), app.bin())]);
}

#[test]
fn nav_activation_clicks_without_the_mouse() {
    let (mut engine, app) = engine_with_app();
    engine.register_test("actions", "nav_click", app.gui(), |ctx| async move {
        ctx.item_nav_activate("Main/Go").await?;
        Ok(())
    });
    engine.queue_test("nav_click");
    engine.run_queue();

    assert_eq!(engine.status("nav_click"), TestStatus::Success);
    let state = app.state.borrow();
    assert_eq!(state.click_count(app.go_button()), 1);
    // The mouse never travelled to the button.
    assert_eq!(state.click_count(app.row_button(0)), 0);
}

#[test]
fn scrolled_out_rows_are_clicked_after_corrective_scroll() {
    let (mut engine, app) = engine_with_app();
    engine.register_test("actions", "scroll_click", app.gui(), |ctx| async move {
        // Row 9 starts well below Main's content area.
        ctx.item_click("Main/Row 9").await?;
        Ok(())
    });
    engine.queue_test("scroll_click");
    engine.run_queue();

    assert_eq!(engine.status("scroll_click"), TestStatus::Success);
    let state = app.state.borrow();
    assert_eq!(state.click_count(app.row_button(9)), 1);
    assert!(state.windows[&app.main_window()].scroll_y > 0.0);
}

#[test]
fn acting_across_windows_corrects_focus_first() {
    let (mut engine, app) = engine_with_app();
    engine.register_test("actions", "cross_window", app.gui(), |ctx| async move {
        // Main starts focused; Tools items need a focus correction.
        ctx.item_click("Tools/Go").await?;
        ctx.item_click("Main/Go").await?;
        Ok(())
    });
    engine.queue_test("cross_window");
    engine.run_queue();

    assert_eq!(engine.status("cross_window"), TestStatus::Success);
    let state = app.state.borrow();
    assert_eq!(
        state.click_count(uiprobe_engine::path_id(
            uiprobe_engine::ItemId::ROOT,
            "Tools/Go"
        )),
        1
    );
    assert_eq!(state.click_count(app.go_button()), 1);
    // Main was refocused by the second action.
    assert_eq!(state.focused_window, Some(app.main_window()));
}

#[test]
fn nav_move_points_focus_then_enter_activates() {
    let (mut engine, app) = engine_with_app();
    engine.register_test("actions", "nav_move_enter", app.gui(), |ctx| async move {
        ctx.set_ref("Main")?;
        // nav_move verifies the item reports focus before returning.
        ctx.nav_move("Enable").await?;
        ctx.nav_activate().await?;
        Ok(())
    });
    engine.queue_test("nav_move_enter");
    engine.run_queue();

    assert_eq!(engine.status("nav_move_enter"), TestStatus::Success);
    assert!(app.state.borrow().is_checked(app.enable_checkbox()));
}

#[test]
fn holding_an_item_clicks_once_on_release() {
    let (mut engine, app) = engine_with_app();
    engine.register_test("actions", "hold_go", app.gui(), |ctx| async move {
        ctx.item_hold("Main/Go", 0.1).await?;
        Ok(())
    });
    engine.queue_test("hold_go");
    engine.run_queue();

    assert_eq!(engine.status("hold_go"), TestStatus::Success);
    // Held frames do not repeat the activation; only the release lands.
    assert_eq!(app.state.borrow().click_count(app.go_button()), 1);
}

#[test]
fn window_move_and_resize_are_verified() {
    let (mut engine, app) = engine_with_app();
    engine.register_test("actions", "tools_geometry", app.gui(), |ctx| async move {
        ctx.window_move("Tools", Pos::new(260.0, 30.0)).await?;
        ctx.window_resize("Tools", Pos::new(180.0, 90.0)).await?;
        Ok(())
    });
    engine.queue_test("tools_geometry");
    engine.run_queue();

    assert_eq!(engine.status("tools_geometry"), TestStatus::Success);
    let state = app.state.borrow();
    assert_eq!(
        state.windows[&app.tools_window()].rect,
        Rect::new(260.0, 30.0, 180.0, 90.0)
    );
}
