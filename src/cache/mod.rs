//! Incremental Cache (C9).
//!
//! Key: `(tool_version, file_content_digest, rule_set_digest,
//! config_digest)`, folded into one 64-bit digest via `hash::hash_parts`
//! and used in hex form as the entry's filename — the same
//! content-addressing discipline this crate's storage layer uses for its
//! segment files. Value: a file's `FileFacts` (symbols + references,
//! C3/C4's output) plus the file-local violations produced for it,
//! `bincode`-serialized.
//!
//! Cross-file rule output is never cached: any graph change forces full
//! cross-file re-evaluation.

use crate::collect::FileFacts;
use crate::error::{EngineError, EngineResult, ErrorContext};
use crate::hash::{fnv1a64_str, hash_parts, hex64};
use crate::model::Violation;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    key_digest: u64,
    facts: FileFacts,
    violations: Vec<Violation>,
}

pub struct Cache {
    dir: PathBuf,
}

/// The four-part cache key, already folded to one digest.
pub fn key_digest(tool_version: &str, file_content_digest: u64, rule_set_digest: u64, config_digest: u64) -> u64 {
    hash_parts(&[tool_version, &hex64(file_content_digest), &hex64(rule_set_digest), &hex64(config_digest)])
}

pub fn file_content_digest(source: &str) -> u64 {
    fnv1a64_str(source)
}

/// Content-hash of a sorted, deduplicated rule-id list.
pub fn rule_set_digest(rule_ids: &[&str]) -> u64 {
    let mut sorted: Vec<&str> = rule_ids.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    hash_parts(&sorted)
}

/// Content-hash of a deterministic serialization of the effective
/// configuration snapshot. Callers pass whatever stable string form they
/// already have (e.g. a sorted `key=value` dump); this function does no
/// interpretation of it.
pub fn config_digest(serialized_effective_config: &str) -> u64 {
    fnv1a64_str(serialized_effective_config)
}

impl Cache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, key: u64) -> PathBuf {
        self.dir.join(format!("{}.bin", hex64(key)))
    }

    /// Reads the entry for `key` if present and intact. A digest mismatch
    /// (corrupt or truncated write) is treated as a cache miss, and the
    /// stale entry is removed rather than served.
    pub fn get(&self, key: u64) -> Option<(FileFacts, Vec<Violation>)> {
        let path = self.entry_path(key);
        let bytes = fs::read(&path).ok()?;
        let entry: CacheEntry = match bincode::deserialize(&bytes) {
            Ok(entry) => entry,
            Err(_) => {
                let _ = fs::remove_file(&path);
                return None;
            }
        };
        if entry.key_digest != key {
            let _ = fs::remove_file(&path);
            return None;
        }
        Some((entry.facts, entry.violations))
    }

    pub fn put(&self, key: u64, facts: &FileFacts, violations: &[Violation]) -> EngineResult<()> {
        fs::create_dir_all(&self.dir).map_err(|source| EngineError::FilesystemWrite { path: self.dir.clone(), source })?;
        let entry = CacheEntry { key_digest: key, facts: facts.clone(), violations: violations.to_vec() };
        let bytes = bincode::serialize(&entry).context("serializing cache entry")?;
        let path = self.entry_path(key);
        fs::write(&path, bytes).map_err(|source| EngineError::FilesystemWrite { path: path.clone(), source })
    }

    /// Individually deletable entries.
    pub fn invalidate(&self, key: u64) {
        let _ = fs::remove_file(self.entry_path(key));
    }

    pub fn clear(&self) -> EngineResult<()> {
        if !self.dir.exists() {
            return Ok(());
        }
        fs::remove_dir_all(&self.dir).map_err(|source| EngineError::FilesystemWrite { path: self.dir.clone(), source })
    }
}

pub fn is_cache_dir(path: &Path) -> bool {
    path.is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileId;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn sample_facts() -> FileFacts {
        FileFacts { file_id: FileId(1), symbols: Vec::new(), references: Vec::new(), symbols_by_name: HashMap::new(), where_clauses: Vec::new() }
    }

    #[test]
    fn round_trips_a_put_entry() {
        let dir = tempdir().unwrap();
        let cache = Cache::new(dir.path());
        let key = key_digest("0.1.0", file_content_digest("let x = 1\n"), rule_set_digest(&["force_unwrap"]), config_digest("profile=default"));
        cache.put(key, &sample_facts(), &[]).unwrap();
        let (facts, violations) = cache.get(key).expect("entry should be present");
        assert_eq!(facts.file_id, FileId(1));
        assert!(violations.is_empty());
    }

    #[test]
    fn miss_on_unknown_key_returns_none() {
        let dir = tempdir().unwrap();
        let cache = Cache::new(dir.path());
        assert!(cache.get(0xdead_beef).is_none());
    }

    #[test]
    fn corrupt_entry_is_discarded_not_served() {
        let dir = tempdir().unwrap();
        let cache = Cache::new(dir.path());
        let key = 42u64;
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(cache.entry_path(key), b"not bincode").unwrap();
        assert!(cache.get(key).is_none());
        assert!(!cache.entry_path(key).exists());
    }

    #[test]
    fn rule_set_digest_is_order_independent() {
        assert_eq!(rule_set_digest(&["b", "a"]), rule_set_digest(&["a", "b"]));
    }

    #[test]
    fn different_file_content_changes_the_key() {
        let a = key_digest("0.1.0", file_content_digest("a"), 1, 1);
        let b = key_digest("0.1.0", file_content_digest("b"), 1, 1);
        assert_ne!(a, b);
    }
}
