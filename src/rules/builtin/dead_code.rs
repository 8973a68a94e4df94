//! Dead-Code Analyzer (C7) — the worked example of a cross-file rule
//! walked through in full: entry-point policy,
//! BFS reachability over the Global Reference Graph, protocol-aware
//! liveness propagation, an ignore policy, and a confidence-to-severity
//! mapping (`Accessibility::dead_code_confidence`, `model/symbol.rs`).

use crate::graph::GlobalReferenceGraph;
use crate::model::{Accessibility, ByteRange, Confidence, EditKind, Location, Severity, StructuredEdit, Symbol, SymbolId, SymbolKind, Violation};
use crate::resolver::ParamValue;
use crate::rules::registry::{CrossFileRule, FileUnit, RuleMeta};
use crate::rules::RuleContext;
use crate::store::LineMap;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPointMode {
    Library,
    Executable,
    Hybrid,
    /// Inspects the loaded file set for a `**/main.*` file to decide
    /// between `Library` and `Executable` (spec §4.7: "auto mode inspects
    /// the project manifest"; this engine has no manifest model, so the
    /// file-pattern signal spec already names is used as the auto
    /// heuristic instead — documented simplification).
    Auto,
}

pub struct DeadCodeRule {
    pub mode: EntryPointMode,
    /// Attribute names that promote a symbol to an entry point regardless
    /// of accessibility (spec: "main-marker, UI-application-marker,
    /// framework-interop marker, action/outlet markers").
    pub entry_attributes: Vec<String>,
    /// Name prefixes excluded from *reporting* (still traversed).
    pub ignore_prefixes: Vec<String>,
    /// Recognized test base class names; types descending from one, and
    /// their `test`-prefixed methods, are entry points.
    pub test_base_classes: Vec<String>,
    /// Protocol name -> synthesized member names kept live when a
    /// conforming type is live (serialization/equatability/hashability/
    /// textual-description protocols spec §4.7 names generically).
    pub synthesized_protocol_members: HashMap<String, Vec<String>>,
}

impl Default for DeadCodeRule {
    fn default() -> Self {
        let mut synthesized_protocol_members = HashMap::new();
        synthesized_protocol_members.insert("Equatable".to_string(), vec!["==".to_string()]);
        synthesized_protocol_members.insert("Hashable".to_string(), vec!["hash".to_string()]);
        synthesized_protocol_members.insert("CustomStringConvertible".to_string(), vec!["description".to_string()]);
        synthesized_protocol_members.insert("Codable".to_string(), vec!["encode".to_string(), "decode".to_string(), "init".to_string()]);
        synthesized_protocol_members.insert("Encodable".to_string(), vec!["encode".to_string()]);
        synthesized_protocol_members.insert("Decodable".to_string(), vec!["decode".to_string(), "init".to_string()]);

        Self {
            mode: EntryPointMode::Auto,
            entry_attributes: vec![
                "main".to_string(),
                "UIApplicationMain".to_string(),
                "NSApplicationMain".to_string(),
                "objc".to_string(),
                "IBAction".to_string(),
                "IBOutlet".to_string(),
            ],
            ignore_prefixes: vec!["_".to_string()],
            test_base_classes: vec!["XCTestCase".to_string()],
            synthesized_protocol_members,
        }
    }
}

impl DeadCodeRule {
    /// Reads a `"mode"` string parameter from the resolved rule settings if
    /// present (spec §4.10: rules fetch typed values with a default),
    /// falling back to this rule's own configured `mode` otherwise.
    fn effective_mode(&self, settings_mode: Option<&ParamValue>) -> EntryPointMode {
        match settings_mode.and_then(ParamValue::as_str) {
            Some("library") => EntryPointMode::Library,
            Some("executable") => EntryPointMode::Executable,
            Some("hybrid") => EntryPointMode::Hybrid,
            Some("auto") => EntryPointMode::Auto,
            _ => self.mode,
        }
    }

    fn resolve_mode(&self, files: &[FileUnit<'_>], settings_mode: Option<&ParamValue>) -> EntryPointMode {
        match self.effective_mode(settings_mode) {
            EntryPointMode::Auto => {
                let has_main_file = files.iter().any(|f| is_main_file(f.relative_path));
                if has_main_file {
                    EntryPointMode::Executable
                } else {
                    EntryPointMode::Library
                }
            }
            other => other,
        }
    }

    fn is_entry_point(&self, symbol: &Symbol, mode: EntryPointMode, main_files: &HashSet<crate::model::FileId>) -> bool {
        if main_files.contains(&symbol.defining_file) {
            return true;
        }
        if self.entry_attributes.iter().any(|a| symbol.has_attribute(a)) {
            return true;
        }
        match mode {
            EntryPointMode::Library | EntryPointMode::Hybrid => {
                matches!(symbol.accessibility, Accessibility::Public | Accessibility::Open)
            }
            EntryPointMode::Executable | EntryPointMode::Auto => false,
        }
    }

    fn is_ignored(&self, symbol: &Symbol) -> bool {
        self.ignore_prefixes.iter().any(|p| symbol.name.starts_with(p.as_str()))
    }

    fn is_test_entry_point(&self, symbol: &Symbol, graph: &GlobalReferenceGraph) -> bool {
        match symbol.kind {
            SymbolKind::Class | SymbolKind::Struct | SymbolKind::ActorIsolatedType => graph
                .conformed_abstractions(&symbol.id)
                .iter()
                .any(|a| self.test_base_classes.iter().any(|t| t == a.name.as_ref())),
            SymbolKind::Method | SymbolKind::Function => {
                symbol.name.starts_with("test")
                    && symbol
                        .parent_id
                        .as_ref()
                        .and_then(|p| graph.symbol(p))
                        .map(|parent| self.is_test_entry_point(parent, graph))
                        .unwrap_or(false)
            }
            _ => false,
        }
    }
}

fn is_main_file(relative_path: &str) -> bool {
    std::path::Path::new(relative_path)
        .file_stem()
        .map(|stem| stem.eq_ignore_ascii_case("main"))
        .unwrap_or(false)
}

impl CrossFileRule for DeadCodeRule {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id: "dead_code",
            name: "Dead code",
            category: "dead-code",
            default_severity: Severity::Warning,
            enabled_by_default: true,
        }
    }

    fn analyze_all(&self, files: &[FileUnit<'_>], graph: &GlobalReferenceGraph, context: &RuleContext<'_>) -> Vec<Violation> {
        let mode_param = context.settings.parameters.get("mode");
        let mode = self.resolve_mode(files, mode_param);
        let main_files: HashSet<crate::model::FileId> = if matches!(mode, EntryPointMode::Executable | EntryPointMode::Auto) {
            files.iter().filter(|f| is_main_file(f.relative_path)).map(|f| f.file_id).collect()
        } else {
            HashSet::new()
        };

        let all_symbols: Vec<&Symbol> = graph.all_symbols().collect();

        let mut children: HashMap<SymbolId, Vec<SymbolId>> = HashMap::new();
        for symbol in &all_symbols {
            if let Some(parent) = &symbol.parent_id {
                children.entry(parent.clone()).or_default().push(symbol.id.clone());
            }
        }

        let mut live: HashSet<SymbolId> = HashSet::new();
        let mut queue: VecDeque<SymbolId> = VecDeque::new();

        for symbol in &all_symbols {
            if self.is_entry_point(symbol, mode, &main_files) || self.is_test_entry_point(symbol, graph) {
                if live.insert(symbol.id.clone()) {
                    queue.push_back(symbol.id.clone());
                }
            }
        }

        let mut processed: HashSet<SymbolId> = HashSet::new();
        while let Some(id) = queue.pop_front() {
            if !processed.insert(id.clone()) {
                continue;
            }
            // Outgoing references.
            for edge in graph.references_from(&id) {
                if live.insert(edge.to.clone()) {
                    queue.push_back(edge.to);
                }
            }
            // Children inherit liveness from their enclosing type/function
            // (spec: initializers/deinitializers inherit from the type).
            if let Some(kids) = children.get(&id) {
                for kid in kids {
                    if live.insert(kid.clone()) {
                        queue.push_back(kid.clone());
                    }
                }
            }
            // Protocol-aware: a live abstraction's requirements' concrete
            // implementations are live too; requirements themselves never
            // get reported dead while the protocol is reachable (spec
            // "Abstract-member handling").
            if let Some(symbol) = graph.symbol(&id) {
                if symbol.kind == SymbolKind::Protocol {
                    for requirement in graph.requirements_of(&id) {
                        if live.insert(requirement.id.clone()) {
                            queue.push_back(requirement.id.clone());
                        }
                        for implementer in graph.implementing_members(&requirement.id) {
                            if live.insert(implementer.id.clone()) {
                                queue.push_back(implementer.id.clone());
                            }
                        }
                    }
                }
                // Synthesized members: a live conforming type keeps its own
                // hand-written overrides of synthesized protocol members
                // live even with no direct reference to them.
                for abstraction in graph.conformed_abstractions(&id) {
                    if let Some(member_names) = self.synthesized_protocol_members.get(abstraction.name.as_ref()) {
                        if let Some(kids) = children.get(&id) {
                            for kid in kids {
                                if let Some(kid_symbol) = graph.symbol(kid) {
                                    if member_names.iter().any(|n| n == kid_symbol.name.as_ref()) && live.insert(kid.clone()) {
                                        queue.push_back(kid.clone());
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }

        let mut violations = Vec::new();
        for symbol in &all_symbols {
            if live.contains(&symbol.id) {
                continue;
            }
            if !is_reportable(symbol.kind) {
                continue;
            }
            if self.is_ignored(symbol) {
                continue;
            }
            violations.push(build_violation(symbol, files));
        }
        violations
    }
}

fn is_reportable(kind: SymbolKind) -> bool {
    !matches!(kind, SymbolKind::AssociatedType | SymbolKind::PrecedenceGroup | SymbolKind::TopLevelCode)
}

fn build_violation(symbol: &Symbol, files: &[FileUnit<'_>]) -> Violation {
    let confidence = symbol.accessibility.dead_code_confidence();
    let severity = confidence.default_severity();
    let relative_path = files
        .iter()
        .find(|f| f.file_id == symbol.defining_file)
        .map(|f| f.relative_path.to_string())
        .unwrap_or_default();
    let (line, column) = files
        .iter()
        .find(|f| f.file_id == symbol.defining_file)
        .map(|f| LineMap::new(f.tree.source()).position_of(symbol.byte_range.start))
        .unwrap_or((1, 1));

    let edit = StructuredEdit {
        range: ByteRange::new(symbol.byte_range.start, symbol.byte_range.end),
        replacement: std::sync::Arc::from(""),
        confidence,
        kind: EditKind::Remove,
    };

    Violation::new(
        "dead_code",
        "dead-code",
        severity,
        std::path::PathBuf::from(relative_path),
        Location { line, column },
        format!("'{}' is never used", symbol.name),
    )
    .with_fix(format!("remove unused {}", symbol.kind.as_str()), edit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::collect_file;
    use crate::model::FileId;
    use crate::parsing::swift::parse;
    use crate::resolver::RuleSettings;
    use crate::rules::context::CancellationToken;
    use std::path::Path;
    use std::sync::Arc;

    fn file_unit<'a>(tree: &'a crate::parsing::SyntaxTree, path: &'a str, id: u32) -> FileUnit<'a> {
        FileUnit { file_id: FileId(id), relative_path: path, tree }
    }

    fn run(files: Vec<(&str, &str)>, rule: &DeadCodeRule) -> Vec<Violation> {
        let trees: Vec<_> = files.iter().map(|(_, src)| parse(Arc::from(*src)).unwrap()).collect();
        let facts: Vec<_> = files
            .iter()
            .zip(&trees)
            .enumerate()
            .map(|(i, ((path, _), tree))| collect_file(tree, Arc::from("App"), path, FileId(i as u32 + 1)))
            .collect();
        let graph = GlobalReferenceGraph::build(facts);
        let units: Vec<_> = files.iter().zip(&trees).enumerate().map(|(i, ((path, _), tree))| file_unit(tree, path, i as u32 + 1)).collect();
        let context = RuleContext {
            project_root: Path::new("."),
            settings: RuleSettings::default(),
            graph: Some(&graph),
            cancellation: CancellationToken::new(),
        };
        rule.analyze_all(&units, &graph, &context)
    }

    #[test]
    fn scenario_s3_library_mode_reports_private_orphan_only() {
        let rule = DeadCodeRule { mode: EntryPointMode::Library, ..DeadCodeRule::default() };
        let violations = run(
            vec![(
                "Lib.swift",
                "public func api() { helper() }\nprivate func helper() {}\nprivate func orphan() {}\n",
            )],
            &rule,
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "'orphan' is never used");
        assert_eq!(violations[0].severity, Severity::Error);
    }

    #[test]
    fn scenario_s4_executable_mode_auto_detects_main_file() {
        let rule = DeadCodeRule::default();
        let violations = run(
            vec![
                ("main.swift", "used()\n"),
                ("Other.swift", "func used() {}\nfunc unused() {}\n"),
            ],
            &rule,
        );
        assert!(violations.iter().any(|v| v.message == "'unused' is never used"));
        assert!(!violations.iter().any(|v| v.message == "'used' is never used"));
    }

    #[test]
    fn underscore_prefixed_symbols_are_ignored_but_still_traverse() {
        let rule = DeadCodeRule { mode: EntryPointMode::Library, ..DeadCodeRule::default() };
        let violations = run(
            vec![(
                "Lib.swift",
                "private func _scratch() { reallyDead() }\nprivate func reallyDead() {}\n",
            )],
            &rule,
        );
        assert!(!violations.iter().any(|v| v.message.contains("_scratch")));
        assert!(violations.iter().any(|v| v.message.contains("reallyDead")));
    }
}
