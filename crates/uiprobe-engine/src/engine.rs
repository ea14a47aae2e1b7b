#![forbid(unsafe_code)]

//! Engine driver: registration, the run queue, and the per-frame tick.
//!
//! # Design Notes
//!
//! The host owns the frame loop and calls [`TestEngine::tick`] once per
//! frame. Each tick advances simulated time, drains one frame's worth of
//! queued input into the simulated device state, runs the active test's
//! GUI callback (which rebuilds the item registry), and then resumes the
//! active script exactly once. Control therefore strictly alternates
//! between host and script; neither ever preempts the other mid-frame.
//!
//! Tests run sequentially. A new test starts only after the previous one
//! reached a terminal status, and gets a short warm-up window of
//! GUI-only frames before its script's first resume so lookups see a
//! settled registry.
//!
//! Runaway scripts are contained twice over: a per-test frame ceiling
//! converts an overlong run into an authoring failure, and after any
//! fatal failure the script is granted a bounded number of further
//! resumes to unwind before the engine drops its future outright
//! (dropping a suspended future is an ordinary, destructor-running
//! cancel).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;

use tracing::{debug, info, warn};
use uiprobe_core::{ItemId, SimulatedInput};

use crate::context::TestCtx;
use crate::error::{TestError, TestResult};
use crate::gui::GuiFrame;
use crate::sched::{Coroutine, ScriptFuture, TestRunState, TestStatus};
use crate::state::{EngineConfig, EngineState, SharedState};
use crate::summary::TestRecord;
use crate::window::WindowOps;

// =============================================================================
// Registration
// =============================================================================

type GuiCallback = Rc<RefCell<dyn FnMut(&mut GuiFrame<'_>)>>;
type ScriptFactory = Rc<dyn Fn(TestCtx) -> ScriptFuture>;

struct RegisteredTest {
    group: String,
    name: Rc<str>,
    gui: GuiCallback,
    script: ScriptFactory,
    status: TestStatus,
}

struct ActiveRun {
    index: usize,
    ctx: TestCtx,
    coroutine: Option<Coroutine>,
    /// Remaining resumes after a fatal failure before the future is
    /// dropped. `None` until a fatal failure is seen.
    drain_left: Option<u32>,
}

// =============================================================================
// Engine
// =============================================================================

/// The test engine. One per host application.
pub struct TestEngine {
    shared: SharedState,
    tests: Vec<RegisteredTest>,
    queue: VecDeque<usize>,
    active: Option<ActiveRun>,
    records: Vec<TestRecord>,
}

impl TestEngine {
    /// Engine with the given configuration and no host window hooks.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            shared: Rc::new(RefCell::new(EngineState::new(config))),
            tests: Vec::new(),
            queue: VecDeque::new(),
            active: None,
            records: Vec::new(),
        }
    }

    /// Install the host's window-operation hooks (focus, raise, scroll,
    /// move, resize).
    pub fn set_window_ops(&mut self, ops: impl WindowOps + 'static) {
        self.shared.borrow_mut().window_ops = Box::new(ops);
    }

    /// Engine configuration, for inspection.
    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.shared.borrow().config.clone()
    }

    /// Register a test: a GUI callback drawn every frame the test is
    /// active, and an async script. Returns an opaque handle usable with
    /// [`queue_index`](Self::queue_index).
    pub fn register_test<G, F, Fut>(&mut self, group: &str, name: &str, gui: G, script: F) -> usize
    where
        G: FnMut(&mut GuiFrame<'_>) + 'static,
        F: Fn(TestCtx) -> Fut + 'static,
        Fut: Future<Output = TestResult<()>> + 'static,
    {
        let index = self.tests.len();
        self.tests.push(RegisteredTest {
            group: group.to_owned(),
            name: Rc::from(name),
            gui: Rc::new(RefCell::new(gui)),
            script: Rc::new(move |ctx| Box::pin(script(ctx)) as ScriptFuture),
            status: TestStatus::Unknown,
        });
        index
    }

    /// Queue a registered test by name. Returns `false` for unknown
    /// names.
    pub fn queue_test(&mut self, name: &str) -> bool {
        match self.tests.iter().position(|t| &*t.name == name) {
            Some(index) => {
                self.queue_index(index);
                true
            }
            None => {
                warn!(name, "queue_test: unknown test");
                false
            }
        }
    }

    /// Queue a registered test by handle.
    ///
    /// # Panics
    /// Panics if `index` was not returned by
    /// [`register_test`](Self::register_test).
    pub fn queue_index(&mut self, index: usize) {
        self.tests[index].status = TestStatus::Queued;
        self.queue.push_back(index);
    }

    /// Queue every registered test, in registration order.
    pub fn queue_all(&mut self) {
        for index in 0..self.tests.len() {
            self.queue_index(index);
        }
    }

    /// Queue every test in a group, in registration order.
    pub fn queue_group(&mut self, group: &str) {
        for index in 0..self.tests.len() {
            if self.tests[index].group == group {
                self.queue_index(index);
            }
        }
    }

    /// Status of a test by name; `Unknown` for unregistered names.
    #[must_use]
    pub fn status(&self, name: &str) -> TestStatus {
        self.tests
            .iter()
            .find(|t| &*t.name == name)
            .map_or(TestStatus::Unknown, |t| t.status)
    }

    /// Whether no test is running and the queue is empty.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    /// Request cooperative termination of the active test and everything
    /// still queued.
    pub fn abort_all(&mut self) {
        self.shared.borrow_mut().abort_all = true;
        self.queue.clear();
        for test in &mut self.tests {
            if test.status == TestStatus::Queued {
                test.status = TestStatus::Unknown;
            }
        }
    }

    /// Records of every finished run, in finish order.
    #[must_use]
    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    /// Engine frame counter.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.shared.borrow().frame_count
    }

    // --- Frame loop ----------------------------------------------------

    /// Advance the engine by one host frame.
    pub fn tick(&mut self, dt: f32) {
        if self.active.is_none() {
            self.start_next();
        }

        self.begin_frame(dt);
        self.run_gui();

        let Some(run) = self.active.as_mut() else {
            return;
        };

        // Warm-up: GUI-only frames before the script's first resume.
        let (warmed_up, total_frames) = {
            let mut state = run.ctx.run.borrow_mut();
            state.total_frames += 1;
            if !state.warmed_up
                && state.total_frames >= self.shared.borrow().config.warmup_frames
            {
                state.warmed_up = true;
            }
            (state.warmed_up, state.total_frames)
        };
        if !warmed_up {
            return;
        }

        // Frame ceiling: an overlong run is an authoring failure. An
        // earlier soft failure does not exempt the run; the ceiling
        // still turns it fatal so the drain budget can reclaim a script
        // that loops on yield_frame without checking for errors.
        let ceiling = self.shared.borrow().config.max_frames_per_test;
        if total_frames > ceiling && !run.ctx.run.borrow().abort {
            run.ctx.record_error(&TestError::authoring(format!(
                "frame ceiling exceeded ({total_frames} > {ceiling} frames); \
                 script never finished"
            )));
            run.ctx.run.borrow_mut().abort = true;
        }

        self.resume_script();
    }

    /// Run every queued test to completion, driving the frame loop at
    /// the fixed timestep. Frame ceilings bound each run, so this always
    /// terminates.
    pub fn run_queue(&mut self) {
        let dt = self.shared.borrow().config.fixed_dt;
        while !self.is_idle() {
            self.tick(dt);
        }
    }

    fn begin_frame(&mut self, dt: f32) {
        let mut shared = self.shared.borrow_mut();
        let state = &mut *shared;
        state.frame_count += 1;
        state.elapsed += f64::from(dt);
        state.last_dt = dt;
        let frame = state.frame_count;
        state.registry.begin_frame(frame);
        state.sim.begin_frame();
        state.queue.apply_one_frame(&mut state.sim);
    }

    /// Draw the active test's GUI for this frame, rebuilding the
    /// registry. Split borrows: the callback sees only the `GuiFrame`.
    fn run_gui(&mut self) {
        let Some(run) = self.active.as_ref() else {
            return;
        };
        let gui = self.tests[run.index].gui.clone();
        let run_state = run.ctx.run.clone();

        let mut shared = self.shared.borrow_mut();
        let state = &mut *shared;
        let mut run_state = run_state.borrow_mut();
        let mut frame = GuiFrame {
            registry: &mut state.registry,
            input: &state.sim,
            frame: state.frame_count,
            dt: state.last_dt,
            nav_focus: state.nav_focus,
            vars: &mut run_state.vars,
        };
        (&mut *gui.borrow_mut())(&mut frame);
    }

    fn start_next(&mut self) {
        let Some(index) = self.queue.pop_front() else {
            return;
        };
        let test = &mut self.tests[index];
        test.status = TestStatus::Running;

        let run = Rc::new(RefCell::new(TestRunState::new()));
        run.borrow_mut().status = TestStatus::Running;
        let ctx = TestCtx {
            shared: self.shared.clone(),
            run,
            test_name: test.name.clone(),
        };
        let coroutine = Coroutine::new((test.script)(ctx.clone()));

        info!(group = %test.group, name = %test.name, "test start");
        self.reset_input();
        self.active = Some(ActiveRun {
            index,
            ctx,
            coroutine: Some(coroutine),
            drain_left: None,
        });
    }

    fn resume_script(&mut self) {
        let Some(run) = self.active.as_mut() else {
            return;
        };

        // After a fatal failure the script gets a bounded number of
        // further resumes to unwind through its `?` chain.
        let fatal = {
            let state = run.ctx.run.borrow();
            self.shared.borrow().abort_all
                || state.abort
                || state.first_error.as_ref().is_some_and(TestError::is_fatal)
        };
        if fatal && run.drain_left.is_none() {
            run.drain_left = Some(self.shared.borrow().config.abort_drain_resumes);
        }
        if let Some(left) = run.drain_left.as_mut() {
            if *left == 0 {
                debug!(name = %run.ctx.test_name, "drain budget exhausted, dropping script");
                run.coroutine = None;
                self.finish(Err(TestError::Aborted));
                return;
            }
            *left -= 1;
        }

        let Some(coroutine) = run.coroutine.as_mut() else {
            return;
        };
        if let std::task::Poll::Ready(result) = coroutine.resume() {
            run.coroutine = None;
            self.finish(result);
        }
    }

    fn finish(&mut self, result: TestResult<()>) {
        let Some(run) = self.active.take() else {
            return;
        };
        let test = &mut self.tests[run.index];

        // Errors surfaced through the context are already recorded; only
        // directly-returned ones need recording here.
        if let Err(err) = &result {
            if run.ctx.run.borrow().first_error.is_none() {
                run.ctx
                    .run
                    .borrow_mut()
                    .record_error(self.shared.borrow().frame_count, err);
            }
        }
        let state = run.ctx.run.borrow();
        let status = if result.is_ok() && !state.is_error() {
            TestStatus::Success
        } else {
            TestStatus::Error
        };
        test.status = status;
        info!(
            group = %test.group,
            name = %test.name,
            ?status,
            frames = state.total_frames,
            "test finish"
        );
        self.records.push(TestRecord::new(
            &test.group,
            &test.name,
            status,
            state.total_frames,
            state.first_error.as_ref(),
            state.log.clone(),
        ));
        drop(state);
        self.reset_input();
    }

    /// Clear pending input and release everything held, so one test's
    /// leftovers cannot leak into the next.
    fn reset_input(&mut self) {
        let mut shared = self.shared.borrow_mut();
        shared.queue.clear();
        shared.sim = SimulatedInput::default();
        shared.nav_focus = ItemId::ROOT;
    }
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
