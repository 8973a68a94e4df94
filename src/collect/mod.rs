//! Symbol and Reference Collectors (C3, C4).

mod scope;
pub mod references;
pub mod symbols;

pub use references::ReferenceCollector;
pub use symbols::SymbolCollector;

use crate::model::{FileId, ModulePath, Symbol, SymbolId, SymbolReference};
use crate::parsing::SyntaxTree;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A single `extension T where <requirements> { ... }` clause, lexically
/// scanned (spec §4.5 passes 3-4; no tree-sitter-swift node kind for
/// `generic_where_clause`/its requirement list could be verified against
/// the grammar, so this follows the same documented-lexical-scan approach
/// `rules::builtin::force_unwrap` already uses for the same reason).
/// `subject` is the extension's own synthetic `ExtensionMember` id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhereClauseFact {
    pub subject: SymbolId,
    pub extended_type_name: Arc<str>,
    pub requirements: Vec<WhereRequirementFact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WhereRequirementFact {
    /// `Element: Hashable` — an associated/generic type param must conform
    /// to an abstraction.
    Conformance { type_param: Arc<str>, abstract_name: Arc<str> },
    /// `Element == Int` — an associated/generic type param is bound to a
    /// concrete type.
    SameType { type_param: Arc<str>, concrete_name: Arc<str> },
}

/// Per-file output of both collectors, the unit the Incremental Cache (C9)
/// stores and the Global Graph (C5) consumes during its index pass.
#[derive(Clone, Serialize, Deserialize)]
pub struct FileFacts {
    pub file_id: FileId,
    pub symbols: Vec<Symbol>,
    pub references: Vec<SymbolReference>,
    pub symbols_by_name: HashMap<Arc<str>, Vec<SymbolId>>,
    pub where_clauses: Vec<WhereClauseFact>,
}

pub fn collect_file(tree: &SyntaxTree, module: ModulePath, relative_path: &str, file_id: FileId) -> FileFacts {
    let (symbols, symbols_by_name, where_clauses) = SymbolCollector::new(tree, module.clone(), relative_path, file_id).collect();
    let references = ReferenceCollector::new(tree, module, relative_path).collect();
    FileFacts { file_id, symbols, references, symbols_by_name, where_clauses }
}
