#![forbid(unsafe_code)]

//! Scheduler behavior across whole runs:
//! - queued tests run strictly one after another
//! - identical runs consume identical frame counts (determinism)
//! - yield_until resumes exactly at the target frame
//! - a script that never finishes hits the frame ceiling and is
//!   contained as an authoring failure
//! - a failed soft check fails the run but lets the script finish
//! - the JSONL export carries one record per run plus a rollup line
//!
//! Run:
//!   cargo test -p uiprobe-harness --test e2e_scheduler

use std::cell::RefCell;
use std::rc::Rc;

use uiprobe_engine::{EngineConfig, TestEngine, TestStatus, check, require_eq, to_jsonl};
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

/// Register the same three-step scenario under the given name.
fn register_scenario(engine: &mut TestEngine, app: &DemoApp, name: &str) {
    engine.register_test("sched", name, app.gui(), |ctx| async move {
        ctx.set_ref("Main")?;
        ctx.item_click("Go").await?;
        ctx.item_check("Enable").await?;
        ctx.item_open("Settings").await?;
        Ok(())
    });
}

#[test]
fn queued_tests_run_strictly_sequentially() {
    let (mut engine, app) = engine_with_app();
    let spans: Rc<RefCell<Vec<(u64, u64)>>> = Rc::new(RefCell::new(Vec::new()));
    for name in ["one", "two", "three"] {
        let spans = spans.clone();
        engine.register_test("sched", name, app.gui(), move |ctx| {
            let spans = spans.clone();
            async move {
                let start = ctx.engine_frame();
                ctx.item_click("Main/Go").await?;
                spans.borrow_mut().push((start, ctx.engine_frame()));
                Ok(())
            }
        });
    }
    engine.queue_all();
    engine.run_queue();

    for name in ["one", "two", "three"] {
        assert_eq!(engine.status(name), TestStatus::Success);
    }
    let spans = spans.borrow();
    assert_eq!(spans.len(), 3);
    // Each test's span ends before the next one starts.
    for pair in spans.windows(2) {
        assert!(pair[0].1 < pair[1].0);
    }
    // Every queued run clicked once; no input leaked between tests.
    assert_eq!(app.state.borrow().click_count(app.go_button()), 3);
}

#[test]
fn yield_until_resumes_exactly_at_the_target_frame() {
    let (mut engine, app) = engine_with_app();
    engine.register_test("sched", "until", app.gui(), |ctx| async move {
        let target = ctx.frame_count() + 7;
        ctx.yield_until(target).await;
        require_eq!(ctx, ctx.frame_count(), target);
        // A target already in the past does not suspend at all.
        let now = ctx.frame_count();
        ctx.yield_until(now).await;
        require_eq!(ctx, ctx.frame_count(), now);
        Ok(())
    });
    engine.queue_test("until");
    engine.run_queue();
    assert_eq!(engine.status("until"), TestStatus::Success);
}

#[test]
fn identical_runs_consume_identical_frames() {
    let frames_of = |name: &str| {
        let (mut engine, app) = engine_with_app();
        register_scenario(&mut engine, &app, name);
        engine.queue_test(name);
        engine.run_queue();
        assert_eq!(engine.status(name), TestStatus::Success);
        engine.records()[0].frames
    };
    assert_eq!(frames_of("run_a"), frames_of("run_b"));
}

#[test]
fn runaway_script_is_contained_by_the_frame_ceiling() {
    let app = DemoApp::new();
    let mut engine = TestEngine::new(EngineConfig {
        warmup_frames: 0,
        max_frames_per_test: 50,
        ..EngineConfig::default()
    });
    app.install(&mut engine);
    engine.register_test("sched", "runaway", app.gui(), |ctx| async move {
        loop {
            ctx.yield_frame().await;
        }
    });
    engine.queue_test("runaway");
    engine.run_queue();

    assert_eq!(engine.status("runaway"), TestStatus::Error);
    let record = &engine.records()[0];
    assert!(record.error.as_deref().is_some_and(|e| e.contains("frame ceiling")));
    let drain = u64::from(EngineConfig::default().abort_drain_resumes);
    assert!(record.frames <= 50 + 1 + drain);
}

#[test]
fn soft_check_failure_lets_the_script_finish() {
    let (mut engine, app) = engine_with_app();
    let finished = Rc::new(std::cell::Cell::new(false));
    let flag = finished.clone();
    engine.register_test("sched", "soft", app.gui(), move |ctx| {
        let flag = flag.clone();
        async move {
            check!(ctx, 2 + 2 == 5);
            flag.set(true);
            Ok(())
        }
    });
    engine.queue_test("soft");
    engine.run_queue();

    assert!(finished.get());
    assert_eq!(engine.status("soft"), TestStatus::Error);
    let record = &engine.records()[0];
    assert!(record.error.as_deref().is_some_and(|e| e.contains("2 + 2 == 5")));
}

#[test]
fn jsonl_export_carries_records_and_rollup() {
    let (mut engine, app) = engine_with_app();
    register_scenario(&mut engine, &app, "good");
    engine.register_test("sched", "bad", app.gui(), |ctx| async move {
        ctx.item_click("Main/Missing").await?;
        Ok(())
    });
    engine.queue_all();
    engine.run_queue();

    let jsonl = to_jsonl(engine.records()).expect("serializable records");
    let lines: Vec<serde_json::Value> = jsonl
        .lines()
        .map(|l| serde_json::from_str(l).expect("valid json line"))
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["name"], "good");
    assert_eq!(lines[0]["status"], "success");
    assert_eq!(lines[1]["name"], "bad");
    assert_eq!(lines[1]["status"], "error");
    assert_eq!(lines[2]["total"], 2);
    assert_eq!(lines[2]["failed"], 1);
    assert_eq!(lines[2]["failing"][0], "bad");
}

#[test]
fn vars_blob_is_private_to_each_run() {
    let (mut engine, app) = engine_with_app();
    engine.register_test("sched", "writer", app.gui(), |ctx| async move {
        ctx.set_vars(42_u32);
        ctx.yield_frame().await;
        let value = ctx.with_vars(|v: &mut u32| *v);
        uiprobe_engine::require_eq!(ctx, value, Some(42));
        Ok(())
    });
    engine.register_test("sched", "reader", app.gui(), |ctx| async move {
        // A fresh run starts with no blob, whatever the previous run did.
        let value = ctx.with_vars(|v: &mut u32| *v);
        uiprobe_engine::require_eq!(ctx, value, None);
        Ok(())
    });
    engine.queue_all();
    engine.run_queue();
    assert_eq!(engine.status("writer"), TestStatus::Success);
    assert_eq!(engine.status("reader"), TestStatus::Success);
}
