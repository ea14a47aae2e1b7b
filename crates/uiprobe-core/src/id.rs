#![forbid(unsafe_code)]

//! Stable item identifiers.
//!
//! An item is identified by a 64-bit hash of its structural label path:
//! each path segment is hashed with the parent's identifier as the seed,
//! so `child_id(child_id(ROOT, "Window"), "Go")` names the same widget on
//! every frame and every run. Identifiers must be deterministic across
//! processes (they appear in logs and can be precomputed by scripts), so
//! the hash is a fixed FNV-1a rather than a randomly seeded hasher.

/// Identifier of one item (widget instance), derived from its label path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

impl ItemId {
    /// The root of the identifier tree. No real item carries this id.
    pub const ROOT: ItemId = ItemId(0);

    /// Whether this is the root sentinel.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Identifier of a child item: hash of `label` seeded with the parent id.
///
/// The root sentinel seeds with the standard FNV offset basis so that
/// absolute and relative hashing compose: `child_id(ROOT, l)` is the id
/// of a top-level item labeled `l`.
#[must_use]
pub fn child_id(parent: ItemId, label: &str) -> ItemId {
    let mut hash = if parent.is_root() {
        FNV_OFFSET
    } else {
        parent.0
    };
    for byte in label.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    // Separator byte keeps "ab"+"c" distinct from "a"+"bc" across levels.
    hash ^= u64::from(b'/');
    hash = hash.wrapping_mul(FNV_PRIME);
    ItemId(hash)
}

/// Identifier of a `/`-separated label path hashed from `base`.
///
/// Empty segments are ignored, so `"a//b"` equals `"a/b"` and a leading
/// slash is harmless here (absolute-vs-relative is decided by the caller).
#[must_use]
pub fn path_id(base: ItemId, path: &str) -> ItemId {
    let mut id = base;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        id = child_id(id, segment);
    }
    id
}
