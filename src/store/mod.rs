//! Source Store (C1): owns loaded files, their trees, line maps and content
//! hashes.

pub mod linemap;
pub mod walker;

pub use linemap::LineMap;
pub use walker::{discover, DiscoveryPolicy};

use crate::error::{EngineError, EngineResult};
use crate::hash::fnv1a64;
use crate::model::FileId;
use crate::parsing::tree::SyntaxTree;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct FileRecord {
    pub id: FileId,
    pub absolute_path: PathBuf,
    pub relative_path: PathBuf,
    pub module_name: Option<String>,
    pub source: Arc<str>,
    pub line_map: Arc<LineMap>,
    pub content_digest: u64,
}

/// Owns every loaded `FileRecord` plus, once the Parser Facade has run,
/// the associated `SyntaxTree`. Invariant: the content digest uniquely
/// determines the tree and all facts derived from it.
pub struct SourceStore {
    next_id: u32,
    records: HashMap<FileId, FileRecord>,
    trees: HashMap<FileId, SyntaxTree>,
    path_to_id: HashMap<PathBuf, FileId>,
    strict_io: bool,
}

impl SourceStore {
    pub fn new(strict_io: bool) -> Self {
        Self {
            next_id: 1,
            records: HashMap::new(),
            trees: HashMap::new(),
            path_to_id: HashMap::new(),
            strict_io,
        }
    }

    /// Reads bytes, computes digests, returns File Records. Skips
    /// unreadable files with a warning unless `strict_io`.
    pub fn load(&mut self, root: &Path, policy: &DiscoveryPolicy) -> EngineResult<Vec<FileId>> {
        let mut loaded = Vec::new();
        for path in discover(root, policy) {
            match std::fs::read_to_string(&path) {
                Ok(source) => {
                    let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
                    loaded.push(self.insert(path, relative, source));
                }
                Err(source) => {
                    if self.strict_io {
                        return Err(EngineError::Filesystem {
                            path: path.clone(),
                            source,
                        });
                    }
                    warn!(path = %path.display(), error = %source, "skipping unreadable file");
                }
            }
        }
        Ok(loaded)
    }

    fn insert(&mut self, absolute_path: PathBuf, relative_path: PathBuf, source: String) -> FileId {
        if let Some(&existing) = self.path_to_id.get(&absolute_path) {
            self.invalidate_id(existing);
        }
        let id = FileId(self.next_id);
        self.next_id += 1;
        let content_digest = fnv1a64(source.as_bytes());
        let source: Arc<str> = source.into();
        let line_map = Arc::new(LineMap::new(&source));
        let module_name = module_name_from_relative(&relative_path);
        debug!(file = %relative_path.display(), digest = content_digest, "loaded file");
        self.path_to_id.insert(absolute_path.clone(), id);
        self.records.insert(
            id,
            FileRecord {
                id,
                absolute_path,
                relative_path,
                module_name,
                source,
                line_map,
                content_digest,
            },
        );
        id
    }

    pub fn set_tree(&mut self, id: FileId, tree: SyntaxTree) {
        self.trees.insert(id, tree);
    }

    pub fn tree(&self, id: FileId) -> Option<&SyntaxTree> {
        self.trees.get(&id)
    }

    pub fn record(&self, id: FileId) -> Option<&FileRecord> {
        self.records.get(&id)
    }

    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.values()
    }

    pub fn file_ids(&self) -> impl Iterator<Item = FileId> + '_ {
        self.records.keys().copied()
    }

    /// Drops the record and its tree. Dependent cache-entry invalidation
    /// is the Incremental Cache's responsibility.
    pub fn invalidate(&mut self, path: &Path) {
        if let Some(id) = self.path_to_id.remove(path) {
            self.invalidate_id(id);
        }
    }

    fn invalidate_id(&mut self, id: FileId) {
        self.records.remove(&id);
        self.trees.remove(&id);
    }
}

fn module_name_from_relative(relative_path: &Path) -> Option<String> {
    relative_path
        .parent()
        .and_then(|p| p.iter().next())
        .map(|os| os.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_computes_stable_digest() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.swift"), "struct A {}").unwrap();
        let mut store = SourceStore::new(false);
        let policy = DiscoveryPolicy::new(&[], &[]);
        let ids = store.load(dir.path(), &policy).unwrap();
        assert_eq!(ids.len(), 1);
        let record = store.record(ids[0]).unwrap();
        assert_ne!(record.content_digest, 0);
    }

    #[test]
    fn invalidate_drops_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.swift");
        std::fs::write(&path, "struct A {}").unwrap();
        let mut store = SourceStore::new(false);
        let policy = DiscoveryPolicy::new(&[], &[]);
        let ids = store.load(dir.path(), &policy).unwrap();
        store.invalidate(&path);
        assert!(store.record(ids[0]).is_none());
    }
}
