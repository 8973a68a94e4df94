//! Shared scope-stack bookkeeping for the Symbol and Reference Collectors.
//!
//! Both walkers need the exact same container push/pop and qualified-name
//! logic so that a `SymbolID` computed by one collector for an enclosing
//! declaration is bitwise identical to the one the other collector derives
//! for the same node (the Reference Collector's `scope_context` must match
//! what the Symbol Collector actually emitted as that declaration's `id`).

use crate::model::{ModulePath, SymbolId, SymbolKind};
use std::sync::Arc;

pub struct ScopeTracker {
    module: ModulePath,
    relative_path: Arc<str>,
    stack: Vec<(SymbolId, String)>,
}

impl ScopeTracker {
    pub fn new(module: ModulePath, relative_path: impl Into<Arc<str>>) -> Self {
        Self {
            module,
            relative_path: relative_path.into(),
            stack: Vec::new(),
        }
    }

    pub fn module(&self) -> &ModulePath {
        &self.module
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn qualify(&self, name: &str) -> Arc<str> {
        match self.stack.last() {
            Some((_, parent_qualified)) => Arc::from(format!("{parent_qualified}.{name}")),
            None => Arc::from(format!("{}.{}", self.module, name)),
        }
    }

    pub fn current(&self) -> Option<SymbolId> {
        self.stack.last().map(|(id, _)| id.clone())
    }

    /// Stable per-file id for the file's top-level scope, independent of
    /// `stack` — used as the `scope_context` for references that occur
    /// outside any declaration, and as the id of the one synthetic
    /// `TopLevelCode` symbol the Symbol Collector emits per file.
    pub fn file_scope_id(&self) -> SymbolId {
        SymbolId::new(self.module.clone(), format!("{}.<top-level>", self.module), SymbolKind::TopLevelCode, &self.relative_path, 0, "<top-level>")
    }

    pub fn in_extension(&self) -> bool {
        self.stack
            .last()
            .map(|(id, _)| id.qualified_name.contains("#extension"))
            .unwrap_or(false)
    }

    /// Computes the `SymbolID` a container declaration would receive and
    /// pushes it as the new top of stack; returns the id so the caller can
    /// also record it as a `Symbol` (only the Symbol Collector does that).
    pub fn push(&mut self, kind: SymbolKind, name: &str, byte_offset: u32) -> SymbolId {
        let qualified = self.qualify(name);
        let id = SymbolId::new(
            self.module.clone(),
            qualified.clone(),
            kind,
            &self.relative_path,
            byte_offset,
            name,
        );
        self.stack.push((id.clone(), qualified.to_string()));
        id
    }

    pub fn pop(&mut self) {
        self.stack.pop();
    }
}
