#![forbid(unsafe_code)]

//! Item registry: the per-frame map from widget identifier to last-seen
//! screen state.
//!
//! The registry is repopulated every frame by the host's widget code as a
//! side effect of drawing. Entries are stamped with the frame they were
//! reported in; an entry whose stamp lags the current frame is stale and
//! is never used for interaction decisions. Stale entries age out on
//! their own — there is no explicit destruction.
//!
//! Draw order is recorded per frame and is the tie-break order for
//! wildcard resolution and the iteration order for gathers.

use ahash::AHashMap;
use bitflags::bitflags;
use uiprobe_core::{ItemId, Rect};

/// How many frames a stale entry is kept around for diagnostics before
/// being pruned from the map.
const STALE_RETENTION_FRAMES: u64 = 2;

bitflags! {
    /// Status of an item as reported by the widget at draw time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ItemStatusFlags: u16 {
        /// Item is on screen and not clipped.
        const VISIBLE = 1 << 0;
        /// Item cannot be interacted with.
        const DISABLED = 1 << 1;
        /// Item is open (tree node, combo, collapsible window).
        const OPENED = 1 << 2;
        /// Item is checked.
        const CHECKED = 1 << 3;
        /// Item supports check/uncheck.
        const CHECKABLE = 1 << 4;
        /// Item supports open/close.
        const OPENABLE = 1 << 5;
        /// Item holds navigation focus.
        const FOCUSED = 1 << 6;
        /// Simulated mouse is over the item.
        const HOVERED = 1 << 7;
    }
}

/// Last-known screen state of one item.
#[derive(Debug, Clone)]
pub struct ItemInfo {
    /// Stable identifier (hash of the structural path).
    pub id: ItemId,
    /// Identifier of the structural parent, [`ItemId::ROOT`] for top-level.
    pub parent: ItemId,
    /// Identifier of the owning window item (self, for windows).
    pub window: ItemId,
    /// Label the item drew with; used for wildcard suffix matching.
    pub label: String,
    /// Screen rectangle at draw time.
    pub rect: Rect,
    /// Status flags at draw time.
    pub flags: ItemStatusFlags,
    /// Frame number this entry was stamped with.
    pub frame: u64,
}

impl ItemInfo {
    /// Whether the item reported itself checked.
    #[must_use]
    pub fn checked(&self) -> bool {
        self.flags.contains(ItemStatusFlags::CHECKED)
    }

    /// Whether the item reported itself opened.
    #[must_use]
    pub fn opened(&self) -> bool {
        self.flags.contains(ItemStatusFlags::OPENED)
    }

    /// Whether the item was visible (unclipped) when drawn.
    #[must_use]
    pub fn visible(&self) -> bool {
        self.flags.contains(ItemStatusFlags::VISIBLE)
    }
}

/// One item report, produced by widget code during a draw.
#[derive(Debug, Clone)]
pub struct ItemReport {
    /// Stable identifier.
    pub id: ItemId,
    /// Structural parent.
    pub parent: ItemId,
    /// Owning window item.
    pub window: ItemId,
    /// Drawn label.
    pub label: String,
    /// Screen rectangle.
    pub rect: Rect,
    /// Status flags.
    pub flags: ItemStatusFlags,
}

/// Per-frame-built mapping from item identifier to last-known state.
#[derive(Debug, Default)]
pub struct ItemRegistry {
    map: AHashMap<ItemId, ItemInfo>,
    order: Vec<ItemId>,
    frame: u64,
}

impl ItemRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The frame number lookups are currently validated against.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Start a new frame: resets draw order and prunes entries that have
    /// been stale for longer than the retention window.
    pub fn begin_frame(&mut self, frame: u64) {
        self.frame = frame;
        self.order.clear();
        self.map
            .retain(|_, info| frame.saturating_sub(info.frame) <= STALE_RETENTION_FRAMES);
    }

    /// Record one drawn item. Overwrites any previous state for the id and
    /// appends to this frame's draw order.
    pub fn report(&mut self, report: ItemReport) {
        let info = ItemInfo {
            id: report.id,
            parent: report.parent,
            window: report.window,
            label: report.label,
            rect: report.rect,
            flags: report.flags,
            frame: self.frame,
        };
        self.order.push(report.id);
        self.map.insert(report.id, info);
    }

    /// The item's state if it drew this frame. Stale entries are invisible
    /// here; interaction decisions must go through this accessor.
    #[must_use]
    pub fn current_item(&self, id: ItemId) -> Option<&ItemInfo> {
        self.map.get(&id).filter(|info| info.frame == self.frame)
    }

    /// The item's last-seen state regardless of staleness. Diagnostics only.
    #[must_use]
    pub fn last_seen(&self, id: ItemId) -> Option<&ItemInfo> {
        self.map.get(&id)
    }

    /// Items drawn this frame, in draw order.
    pub fn items_in_draw_order(&self) -> impl Iterator<Item = &ItemInfo> {
        self.order.iter().filter_map(|id| self.current_item(*id))
    }

    /// Whether `id`'s parent chain passes through `ancestor` within
    /// `depth` levels (`depth < 0` = unbounded). An item is not its own
    /// descendant.
    #[must_use]
    pub fn is_descendant(&self, id: ItemId, ancestor: ItemId, depth: i32) -> bool {
        let mut cur = match self.current_item(id) {
            Some(info) => info.parent,
            None => return false,
        };
        let mut levels = 1;
        loop {
            if cur == ancestor {
                return depth < 0 || levels <= depth;
            }
            if cur.is_root() {
                // ROOT as the ancestor matches every top-level chain above.
                return ancestor.is_root();
            }
            cur = match self.current_item(cur) {
                Some(info) => info.parent,
                None => return false,
            };
            levels += 1;
        }
    }

    /// All items drawn this frame whose parent chain passes through
    /// `parent` within `depth` levels, in draw order.
    #[must_use]
    pub fn gather(&self, parent: ItemId, depth: i32) -> Vec<ItemInfo> {
        self.items_in_draw_order()
            .filter(|info| info.id != parent && self.is_descendant(info.id, parent, depth))
            .cloned()
            .collect()
    }

    /// Resolve a wildcard suffix: find items whose label chain ends with
    /// `suffix` (exactly `suffix.len()` levels) and whose remaining
    /// ancestor chain contains `prefix` (or any chain when `prefix` is
    /// ROOT). Returns the first match in draw order plus the total number
    /// of candidates, so callers can surface ambiguity.
    #[must_use]
    pub fn find_by_label_suffix(&self, prefix: ItemId, suffix: &[String]) -> (Option<ItemId>, usize) {
        let Some(last) = suffix.last() else {
            return (None, 0);
        };
        let mut first = None;
        let mut count = 0;
        for info in self.items_in_draw_order() {
            if info.label != *last {
                continue;
            }
            if let Some(anchor) = self.match_suffix_chain(info, suffix) {
                if self.chain_contains(anchor, prefix) {
                    count += 1;
                    if first.is_none() {
                        first = Some(info.id);
                    }
                }
            }
        }
        (first, count)
    }

    /// Walk up from `info` matching `suffix` labels back-to-front; returns
    /// the parent above the topmost matched segment.
    fn match_suffix_chain(&self, info: &ItemInfo, suffix: &[String]) -> Option<ItemId> {
        let mut cur = info;
        for label in suffix.iter().rev().skip(1) {
            cur = self.current_item(cur.parent)?;
            if cur.label != *label {
                return None;
            }
        }
        Some(cur.parent)
    }

    /// Whether `target` appears on the ancestor chain starting at `id`
    /// (inclusive). ROOT matches any chain.
    fn chain_contains(&self, id: ItemId, target: ItemId) -> bool {
        if target.is_root() {
            return true;
        }
        let mut cur = id;
        loop {
            if cur == target {
                return true;
            }
            if cur.is_root() {
                return false;
            }
            cur = match self.current_item(cur) {
                Some(info) => info.parent,
                None => return false,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uiprobe_core::child_id;

    fn report(reg: &mut ItemRegistry, parent: ItemId, window: ItemId, label: &str) -> ItemId {
        let id = child_id(parent, label);
        reg.report(ItemReport {
            id,
            parent,
            window,
            label: label.to_owned(),
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            flags: ItemStatusFlags::VISIBLE,
        });
        id
    }

    fn window_tree(reg: &mut ItemRegistry) -> (ItemId, ItemId, ItemId) {
        let win = report(reg, ItemId::ROOT, ItemId::ROOT, "Window");
        let node = report(reg, win, win, "Node");
        let leaf = report(reg, node, win, "Leaf");
        (win, node, leaf)
    }

    #[test]
    fn entries_stale_out_by_frame_stamp() {
        let mut reg = ItemRegistry::new();
        reg.begin_frame(1);
        let id = report(&mut reg, ItemId::ROOT, ItemId::ROOT, "Go");
        assert!(reg.current_item(id).is_some());

        reg.begin_frame(2);
        assert!(reg.current_item(id).is_none());
        assert!(reg.last_seen(id).is_some());
    }

    #[test]
    fn stale_entries_pruned_after_retention() {
        let mut reg = ItemRegistry::new();
        reg.begin_frame(1);
        let id = report(&mut reg, ItemId::ROOT, ItemId::ROOT, "Go");
        reg.begin_frame(2);
        reg.begin_frame(3);
        reg.begin_frame(4);
        assert!(reg.last_seen(id).is_none());
    }

    #[test]
    fn gather_respects_depth_bound() {
        let mut reg = ItemRegistry::new();
        reg.begin_frame(1);
        let (win, node, leaf) = window_tree(&mut reg);

        let unbounded = reg.gather(win, -1);
        assert_eq!(unbounded.len(), 2);
        assert_eq!(unbounded[0].id, node);
        assert_eq!(unbounded[1].id, leaf);

        let shallow = reg.gather(win, 1);
        assert_eq!(shallow.len(), 1);
        assert_eq!(shallow[0].id, node);
    }

    #[test]
    fn gather_from_root_sees_everything() {
        let mut reg = ItemRegistry::new();
        reg.begin_frame(1);
        window_tree(&mut reg);
        assert_eq!(reg.gather(ItemId::ROOT, -1).len(), 3);
    }

    #[test]
    fn wildcard_matches_suffix_chain() {
        let mut reg = ItemRegistry::new();
        reg.begin_frame(1);
        let (win, node, leaf) = window_tree(&mut reg);

        let suffix = vec!["Node".to_owned(), "Leaf".to_owned()];
        let (found, count) = reg.find_by_label_suffix(ItemId::ROOT, &suffix);
        assert_eq!(found, Some(leaf));
        assert_eq!(count, 1);

        // Prefix anchored at the window also matches.
        let (found, _) = reg.find_by_label_suffix(win, &suffix);
        assert_eq!(found, Some(leaf));

        // A prefix that is not on the chain does not.
        let (found, count) = reg.find_by_label_suffix(node, &["Node".to_owned()]);
        assert_eq!(found, None);
        assert_eq!(count, 0);
    }

    #[test]
    fn wildcard_first_match_wins_and_counts_candidates() {
        let mut reg = ItemRegistry::new();
        reg.begin_frame(1);
        let win_a = report(&mut reg, ItemId::ROOT, ItemId::ROOT, "A");
        let first = report(&mut reg, win_a, win_a, "Go");
        let win_b = report(&mut reg, ItemId::ROOT, ItemId::ROOT, "B");
        let _second = report(&mut reg, win_b, win_b, "Go");

        let (found, count) = reg.find_by_label_suffix(ItemId::ROOT, &["Go".to_owned()]);
        assert_eq!(found, Some(first));
        assert_eq!(count, 2);
    }

    #[test]
    fn wildcard_suffix_depth_is_exact() {
        let mut reg = ItemRegistry::new();
        reg.begin_frame(1);
        let (_win, _node, leaf) = window_tree(&mut reg);

        // "Leaf" alone matches at depth 1 regardless of nesting above.
        let (found, _) = reg.find_by_label_suffix(ItemId::ROOT, &["Leaf".to_owned()]);
        assert_eq!(found, Some(leaf));

        // A chain whose labels do not line up does not match.
        let suffix = vec!["Window".to_owned(), "Leaf".to_owned()];
        let (found, count) = reg.find_by_label_suffix(ItemId::ROOT, &suffix);
        assert_eq!(found, None);
        assert_eq!(count, 0);
    }
}
