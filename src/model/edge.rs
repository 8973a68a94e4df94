//! Resolved graph edges (spec §3 "Resolved Edge (E)").

use super::ids::SymbolId;
use super::reference::ReferenceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEdge {
    pub from: SymbolId,
    pub to: SymbolId,
    /// Multiple references between the same two symbols collapse into a
    /// single edge, but the distinct reference kinds that produced it are
    /// retained (spec §3: "the set of kinds is retained").
    pub kinds: BTreeSet<ReferenceKindOrd>,
}

/// `ReferenceKind` wrapped for use in an ordered set; the kind enum itself
/// has no natural order and doesn't need one outside this container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReferenceKindOrd(pub ReferenceKind);

impl From<ReferenceKind> for ReferenceKindOrd {
    fn from(k: ReferenceKind) -> Self {
        Self(k)
    }
}

// ReferenceKind needs a total order to live in a BTreeSet; derive it via
// discriminant, since variant order is stable within this crate.
impl PartialOrd for ReferenceKind {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReferenceKind {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (*self as u8).cmp(&(*other as u8))
    }
}
