#![forbid(unsafe_code)]

//! Query engine: resolving references against the per-frame registry.
//!
//! Non-blocking lookups answer from whatever drew this frame. Blocking
//! lookups yield between checks until the item appears or a frame-counted
//! budget runs out; the budget is frames, not wall-clock, so waits stay
//! deterministic under accelerated or slowed simulated time.
//!
//! The first check happens before the first yield: a zero-frame budget on
//! a reference that never appears fails immediately without advancing the
//! frame counter.

use tracing::debug;
use uiprobe_core::TestRef;

use crate::context::TestCtx;
use crate::error::{TestError, TestResult};
use crate::registry::ItemInfo;

impl TestCtx {
    /// The item's state if it drew this frame. Never blocks, never stale.
    #[must_use]
    pub fn item_info(&self, r: impl Into<TestRef>) -> Option<ItemInfo> {
        self.find_now(&r.into())
    }

    /// Whether the reference resolves to an item drawn this frame.
    #[must_use]
    pub fn item_exists(&self, r: impl Into<TestRef>) -> bool {
        self.item_info(r).is_some()
    }

    /// Blocking locate with the configured default wait budget.
    pub async fn item_locate(&self, r: impl Into<TestRef>) -> TestResult<ItemInfo> {
        let budget = self.shared.borrow().config.wait_budget_frames();
        self.item_locate_with_budget(r, budget).await
    }

    /// Blocking locate with an explicit frame budget.
    ///
    /// Returns the item's state stamped with the frame it appeared on —
    /// never an older frame's state. Fails with a lookup error once
    /// `budget_frames` frames have been waited.
    pub async fn item_locate_with_budget(
        &self,
        r: impl Into<TestRef>,
        budget_frames: u64,
    ) -> TestResult<ItemInfo> {
        let r = r.into();
        let mut waited = 0_u64;
        loop {
            if self.aborted() {
                return Err(TestError::Aborted);
            }
            if let Some(info) = self.find_now(&r) {
                return Ok(info);
            }
            if let Some(fatal) = self.fatal_error() {
                return Err(fatal);
            }
            if waited >= budget_frames {
                return self.fail(TestError::lookup(self.describe_ref(&r), waited));
            }
            self.yield_frame().await;
            waited += 1;
        }
    }

    /// Enumerate all items under `parent` within `depth` levels
    /// (`depth < 0` = unbounded), in draw order.
    ///
    /// The gather spans exactly one yield: the request is armed before a
    /// frame and harvested after it, so every returned item comes from a
    /// single fresh frame.
    pub async fn gather_items(
        &self,
        parent: impl Into<TestRef>,
        depth: i32,
    ) -> TestResult<Vec<ItemInfo>> {
        let parent = parent.into();
        let parent_id = match self.resolve_id(&parent) {
            Ok(id) => id,
            // Wildcard parents may not have drawn yet; wait for them.
            Err(_) => self.item_locate(parent.clone()).await?.id,
        };
        self.yield_frame().await;
        let items = self.shared.borrow().registry.gather(parent_id, depth);
        debug!(
            test = %self.test_name,
            parent = %self.describe_ref(&parent),
            count = items.len(),
            "gather"
        );
        Ok(items)
    }

    /// Resolve and look up a reference against this frame's registry.
    pub(crate) fn find_now(&self, r: &TestRef) -> Option<ItemInfo> {
        let id = self.resolve_id(r).ok()?;
        self.shared.borrow().registry.current_item(id).cloned()
    }

    /// Whether an abort (run- or engine-level) has been requested. Unlike
    /// [`TestCtx::is_error`], a recorded assertion failure does not stop
    /// further queries: later checks in the same test still execute.
    pub(crate) fn aborted(&self) -> bool {
        self.run.borrow().abort || self.shared.borrow().abort_all
    }

    /// Fatal failure already recorded on this run, if any. Retry loops
    /// check it so a broken reference fails once instead of burning the
    /// whole wait budget re-resolving it.
    pub(crate) fn fatal_error(&self) -> Option<TestError> {
        self.run
            .borrow()
            .first_error
            .as_ref()
            .filter(|e| e.is_fatal())
            .cloned()
    }
}
