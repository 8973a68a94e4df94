//! Rule catalog (spec §4.6: "each rule declares id, human name, category,
//! default_severity, enabled_by_default, and whether it is file-local or
//! cross-file").

use super::context::RuleContext;
use crate::graph::GlobalReferenceGraph;
use crate::model::{FileId, Severity, Violation};
use crate::parsing::SyntaxTree;

#[derive(Debug, Clone)]
pub struct RuleMeta {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub default_severity: Severity,
    pub enabled_by_default: bool,
}

/// A single file's analysis input for a file-local rule.
pub struct FileUnit<'a> {
    pub file_id: FileId,
    pub relative_path: &'a str,
    pub tree: &'a SyntaxTree,
}

pub trait FileLocalRule: Send + Sync {
    fn meta(&self) -> RuleMeta;
    fn analyze(&self, file: &FileUnit<'_>, context: &RuleContext<'_>) -> Vec<Violation>;
}

pub trait CrossFileRule: Send + Sync {
    fn meta(&self) -> RuleMeta;
    fn analyze_all(&self, files: &[FileUnit<'_>], graph: &GlobalReferenceGraph, context: &RuleContext<'_>) -> Vec<Violation>;
}

/// The dispatcher's catalog of known rules (spec §4.6's "polymorphic over
/// the union of the two" rule shapes, per spec §9's "Polymorphic rules"
/// design note).
#[derive(Default)]
pub struct RuleRegistry {
    file_local: Vec<Box<dyn FileLocalRule>>,
    cross_file: Vec<Box<dyn CrossFileRule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_file_local(&mut self, rule: Box<dyn FileLocalRule>) {
        self.file_local.push(rule);
    }

    pub fn register_cross_file(&mut self, rule: Box<dyn CrossFileRule>) {
        self.cross_file.push(rule);
    }

    pub fn file_local_rules(&self) -> &[Box<dyn FileLocalRule>] {
        &self.file_local
    }

    pub fn cross_file_rules(&self) -> &[Box<dyn CrossFileRule>] {
        &self.cross_file
    }

    /// `RuleMeta` for every registered rule, file-local and cross-file
    /// alike; used to build the rule-to-category map the Configuration
    /// Resolver (C10) needs and to back the `explain` verb (spec §6).
    pub fn all_metas(&self) -> Vec<RuleMeta> {
        self.file_local
            .iter()
            .map(|r| r.meta())
            .chain(self.cross_file.iter().map(|r| r.meta()))
            .collect()
    }

    pub fn find_meta(&self, rule_id: &str) -> Option<RuleMeta> {
        self.all_metas().into_iter().find(|m| m.id == rule_id)
    }

    /// The registry every `engine.rs` verb starts from: the two pinned
    /// rules plus the Dead-Code Analyzer (C7).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_file_local(Box::new(super::builtin::force_unwrap::ForceUnwrapRule));
        registry.register_cross_file(Box::new(super::builtin::reference_cycle::ReferenceCycleRule));
        registry.register_cross_file(Box::new(super::builtin::dead_code::DeadCodeRule::default()));
        registry
    }
}
