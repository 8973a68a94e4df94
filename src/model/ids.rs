//! Stable, content-addressed identity types.
//!
//! `SymbolID` is deliberately not a dense arena index: the id set for an
//! unchanged file must stay bitwise identical across runs and independent
//! of what other files happen to be loaded. A `NonZeroU32` counter (as
//! used for internal graph node handles) cannot offer that, since
//! counters depend on insertion order. So identity is a small value
//! struct over four stable fields, with a precomputed digest used as the
//! `Hash` implementation's fast path.

use crate::hash::fnv1a64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub u32);

/// A module path, e.g. `App.Networking`.
pub type ModulePath = Arc<str>;

#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct SymbolId {
    pub module: ModulePath,
    pub qualified_name: Arc<str>,
    pub kind: super::symbol::SymbolKind,
    /// FNV-1a64 of (file-relative path, byte offset, name); see `hash.rs`.
    pub location_digest: u64,
}

impl SymbolId {
    pub fn new(
        module: impl Into<ModulePath>,
        qualified_name: impl Into<Arc<str>>,
        kind: super::symbol::SymbolKind,
        file_relative_path: &str,
        byte_offset: u32,
        name: &str,
    ) -> Self {
        let location_digest = location_digest(file_relative_path, byte_offset, name);
        Self {
            module: module.into(),
            qualified_name: qualified_name.into(),
            kind,
            location_digest,
        }
    }
}

/// `location_digest` from spec §3: a short hash of (file-relative path,
/// byte offset, name), stable across unrelated edits but disambiguating
/// overloads sharing a qualified name.
pub fn location_digest(file_relative_path: &str, byte_offset: u32, name: &str) -> u64 {
    let mut bytes = Vec::with_capacity(file_relative_path.len() + 4 + name.len());
    bytes.extend_from_slice(file_relative_path.as_bytes());
    bytes.extend_from_slice(&byte_offset.to_le_bytes());
    bytes.extend_from_slice(name.as_bytes());
    fnv1a64(&bytes)
}

impl PartialEq for SymbolId {
    fn eq(&self, other: &Self) -> bool {
        self.location_digest == other.location_digest
            && self.kind == other.kind
            && self.module == other.module
            && self.qualified_name == other.qualified_name
    }
}

impl std::hash::Hash for SymbolId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // location_digest alone is already a good-quality 64-bit hash over
        // the identifying fields; hashing just it keeps lookups cheap while
        // equality (above) still checks the full tuple, so a digest
        // collision across distinct (module, name, kind) can never be
        // mistaken for identity.
        state.write_u64(self.location_digest);
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}#{:016x}",
            self.module, self.qualified_name, self.location_digest
        )
    }
}
