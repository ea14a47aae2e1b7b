#![forbid(unsafe_code)]

//! Widget references.
//!
//! A [`TestRef`] names a target widget either by a precomputed [`ItemId`]
//! or by a `/`-separated label path. Paths support:
//!
//! - a leading `/` for absolute addressing (resolved from the root rather
//!   than the script's current reference scope), and
//! - a single `**` segment meaning "any number of intervening levels,
//!   then match the remaining labels as a suffix".
//!
//! Path resolution is lazy: the registry is rebuilt every frame, so a
//! path is re-resolved every time it is used and never cached.

use crate::id::ItemId;

/// A reference to a target widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestRef {
    /// A precomputed identifier.
    Id(ItemId),
    /// A label path, possibly relative and possibly containing `**`.
    Path(String),
}

impl TestRef {
    /// Human-readable form for diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Id(id) => id.to_string(),
            Self::Path(p) => p.clone(),
        }
    }
}

impl From<ItemId> for TestRef {
    fn from(id: ItemId) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for TestRef {
    fn from(path: &str) -> Self {
        Self::Path(path.to_owned())
    }
}

impl From<String> for TestRef {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

/// A label path split into its structural parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    /// Leading `/` present: resolve from the root, not the current scope.
    pub absolute: bool,
    /// Labels before the `**` segment (all labels when not a wildcard).
    pub prefix: Vec<String>,
    /// Whether a `**` segment is present.
    pub wildcard: bool,
    /// Labels after the `**` segment. Non-empty iff `wildcard`.
    pub suffix: Vec<String>,
}

impl ParsedPath {
    /// Parse a path string. Empty segments collapse; a second `**` or a
    /// trailing `**` makes the path malformed and returns `None`.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let absolute = path.starts_with('/');
        let mut prefix = Vec::new();
        let mut suffix = Vec::new();
        let mut wildcard = false;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if segment == "**" {
                if wildcard {
                    return None;
                }
                wildcard = true;
            } else if wildcard {
                suffix.push(segment.to_owned());
            } else {
                prefix.push(segment.to_owned());
            }
        }
        if wildcard && suffix.is_empty() {
            return None;
        }
        Some(Self {
            absolute,
            prefix,
            wildcard,
            suffix,
        })
    }
}
