#![forbid(unsafe_code)]

//! Input storm fault injection: arbitrary event barrages must never
//! wedge the engine or corrupt widget state.
//!
//! Properties:
//! - every storm run reaches a terminal status and leaves the engine idle
//! - a button's activation count never exceeds the number of left-button
//!   release edges the storm could have produced
//!
//! Run:
//!   cargo test -p uiprobe-harness --test input_storm

use std::rc::Rc;

use proptest::prelude::*;
use uiprobe_engine::{
    EngineConfig, InputEvent, Key, Modifiers, MouseButton, Pos, TestEngine,
};
use uiprobe_harness::DemoApp;

/// Decode one storm opcode into an input event. Positions sweep across
/// the fixture's windows so some land on widgets and some on nothing.
fn decode(op: u8, step: usize) -> InputEvent {
    let x = (step as f32 * 17.0) % 440.0;
    let y = (step as f32 * 11.0) % 160.0;
    match op % 6 {
        0 | 1 => InputEvent::MouseMoveTo(Pos::new(x, y)),
        2 => InputEvent::MouseButtonDown(MouseButton::Left),
        3 => InputEvent::MouseButtonUp(MouseButton::Left),
        4 => InputEvent::KeyDown(Key::Enter, Modifiers::empty()),
        _ => InputEvent::KeyUp(Key::Enter, Modifiers::empty()),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn storms_always_terminate_and_stay_consistent(ops in prop::collection::vec(any::<u8>(), 0..200)) {
        let app = DemoApp::new();
        let mut engine = TestEngine::new(EngineConfig {
            warmup_frames: 1,
            max_frames_per_test: 1_000,
            ..EngineConfig::default()
        });
        app.install(&mut engine);

        let releases = ops.iter().filter(|op| *op % 6 == 3).count() as u32;
        let shared_ops = Rc::new(ops);
        let script_ops = shared_ops.clone();
        engine.register_test("storm", "barrage", app.gui(), move |ctx| {
            let ops = script_ops.clone();
            async move {
                for (step, op) in ops.iter().enumerate() {
                    ctx.enqueue(decode(*op, step));
                    if step % 4 == 3 {
                        ctx.yield_frame().await;
                    }
                }
                // Let the queue fully drain.
                ctx.yield_frames(ops.len() as u64 + 2).await;
                Ok(())
            }
        });
        engine.queue_test("barrage");
        engine.run_queue();

        prop_assert!(engine.is_idle());
        prop_assert!(engine.status("barrage").is_terminal());
        let state = app.state.borrow();
        prop_assert!(state.click_count(app.go_button()) <= releases);
    }
}
