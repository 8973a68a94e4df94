//! Parser Facade (C2): parses source into an immutable syntax tree and
//! exposes the visitor protocol.

pub mod swift;
pub mod tree;
pub mod visitor;

pub use tree::SyntaxTree;
pub use visitor::{walk, VisitDecision, Visitor};

use crate::error::{EngineError, EngineResult};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Swift,
}

impl Language {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "swift" => Some(Self::Swift),
            _ => None,
        }
    }
}

/// `parse(bytes) -> T`, a pure function. Never fails outright:
/// tree-sitter always returns a tree, possibly containing error nodes,
/// which downstream collectors are required to skip. `EngineError::Parse`
/// is reserved for the case tree-sitter itself refuses to run (e.g. source
/// too large), which this facade surfaces rather than panicking on.
pub fn parse(language: Language, source: Arc<str>) -> EngineResult<SyntaxTree> {
    match language {
        Language::Swift => swift::parse(source),
    }
}

pub(crate) fn parser_init_error(reason: impl Into<String>) -> EngineError {
    EngineError::General(format!("parser init failed: {}", reason.into()))
}
