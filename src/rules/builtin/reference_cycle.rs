//! `reference_cycle`: a cross-file rule reporting cycles among type
//! declarations reached via type-reference, inheritance, or conformance
//! edges.
//!
//! A pinned scenario: three files declaring `A -> B -> C -> A` by
//! type-reference produce a single `error` naming the cycle `A, B, C, A`,
//! rotated to start at the lexicographically smallest member so the
//! output is deterministic regardless of which file the Dispatcher
//! happened to index first.

use crate::graph::GlobalReferenceGraph;
use crate::model::{Location, ReferenceKind, Severity, SymbolId, SymbolKind, Violation};
use crate::rules::registry::{CrossFileRule, FileUnit, RuleMeta};
use crate::rules::RuleContext;
use crate::store::LineMap;
use std::collections::{HashMap, HashSet};

pub struct ReferenceCycleRule;

const TYPE_KINDS: &[SymbolKind] = &[
    SymbolKind::Class,
    SymbolKind::Struct,
    SymbolKind::Enum,
    SymbolKind::Protocol,
    SymbolKind::ActorIsolatedType,
];

const CYCLE_EDGE_KINDS: &[ReferenceKind] = &[
    ReferenceKind::TypeReference,
    ReferenceKind::Inheritance,
    ReferenceKind::Conformance,
];

impl CrossFileRule for ReferenceCycleRule {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id: "reference_cycle",
            name: "Reference cycle",
            category: "correctness",
            default_severity: Severity::Error,
            enabled_by_default: true,
        }
    }

    fn analyze_all(&self, files: &[FileUnit<'_>], graph: &GlobalReferenceGraph, _context: &RuleContext<'_>) -> Vec<Violation> {
        let mut type_symbols: Vec<SymbolId> = TYPE_KINDS
            .iter()
            .flat_map(|&kind| graph.symbols_of_kind(kind))
            .map(|s| s.id.clone())
            .collect();
        type_symbols.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));

        let mut adjacency: HashMap<SymbolId, Vec<SymbolId>> = HashMap::new();
        let type_set: HashSet<SymbolId> = type_symbols.iter().cloned().collect();
        for id in &type_symbols {
            let mut targets: Vec<SymbolId> = graph
                .references_from(id)
                .into_iter()
                .filter(|edge| edge.kinds.iter().any(|k| CYCLE_EDGE_KINDS.contains(&k.0)))
                .map(|edge| edge.to)
                .filter(|to| type_set.contains(to) && to != id)
                .collect();
            targets.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));
            targets.dedup();
            adjacency.insert(id.clone(), targets);
        }

        let mut seen_cycles: HashSet<Vec<SymbolId>> = HashSet::new();
        let mut violations = Vec::new();

        for start in &type_symbols {
            if let Some(cycle) = find_cycle_from(start, &adjacency) {
                let canonical = canonicalize(cycle);
                if seen_cycles.insert(canonical.clone()) {
                    violations.push(build_violation(&canonical, graph, files));
                }
            }
        }

        violations
    }
}

/// DFS from `start` looking for a path back to `start`; returns the cycle
/// (not including the repeated closing node) if found.
fn find_cycle_from(start: &SymbolId, adjacency: &HashMap<SymbolId, Vec<SymbolId>>) -> Option<Vec<SymbolId>> {
    let mut stack = vec![start.clone()];
    let mut on_stack: HashSet<SymbolId> = [start.clone()].into_iter().collect();
    let mut visited: HashSet<SymbolId> = HashSet::new();

    fn visit(
        node: &SymbolId,
        start: &SymbolId,
        adjacency: &HashMap<SymbolId, Vec<SymbolId>>,
        stack: &mut Vec<SymbolId>,
        on_stack: &mut HashSet<SymbolId>,
        visited: &mut HashSet<SymbolId>,
    ) -> Option<Vec<SymbolId>> {
        let Some(neighbors) = adjacency.get(node) else { return None };
        for next in neighbors {
            if next == start && stack.len() > 1 {
                return Some(stack.clone());
            }
            if on_stack.contains(next) {
                continue;
            }
            if visited.contains(next) {
                continue;
            }
            stack.push(next.clone());
            on_stack.insert(next.clone());
            if let Some(found) = visit(next, start, adjacency, stack, on_stack, visited) {
                return Some(found);
            }
            on_stack.remove(next);
            stack.pop();
            visited.insert(next.clone());
        }
        None
    }

    visit(start, start, adjacency, &mut stack, &mut on_stack, &mut visited)
}

/// Rotates `cycle` so it starts at the lexicographically smallest member by
/// qualified name (spec S2: "deterministic rotation (starting from the
/// lexicographically smallest member)").
fn canonicalize(cycle: Vec<SymbolId>) -> Vec<SymbolId> {
    let min_index = cycle
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.qualified_name.cmp(&b.qualified_name))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let mut rotated = Vec::with_capacity(cycle.len());
    rotated.extend_from_slice(&cycle[min_index..]);
    rotated.extend_from_slice(&cycle[..min_index]);
    rotated
}

fn build_violation(cycle: &[SymbolId], graph: &GlobalReferenceGraph, files: &[FileUnit<'_>]) -> Violation {
    let names: Vec<&str> = cycle.iter().map(|id| id.qualified_name.as_ref()).collect();
    let mut display: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    if let Some(first) = names.first() {
        display.push(first.to_string());
    }
    let message = format!("cyclic type reference: {}", display.join(", "));

    let first = &cycle[0];
    let symbol = graph.symbol(first);
    let file_id = symbol.map(|s| s.defining_file);
    let byte_offset = symbol.map(|s| s.byte_range.start).unwrap_or(0);
    let file = file_id
        .and_then(|fid| files.iter().find(|f| f.file_id == fid))
        .map(|f| f.relative_path.to_string())
        .unwrap_or_default();
    let (line, column) = file_id
        .and_then(|fid| files.iter().find(|f| f.file_id == fid))
        .map(|f| LineMap::new(f.tree.source()).position_of(byte_offset))
        .unwrap_or((1, 1));

    let mut context = std::collections::BTreeMap::new();
    context.insert("cycle".to_string(), display.join(", "));

    let mut violation = Violation::new(
        "reference_cycle",
        "correctness",
        Severity::Error,
        std::path::PathBuf::from(file),
        Location { line, column },
        message,
    );
    violation.context = context;
    violation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::collect_file;
    use crate::model::FileId;
    use crate::parsing::swift::parse;
    use crate::rules::context::CancellationToken;
    use crate::resolver::RuleSettings;
    use std::path::Path;
    use std::sync::Arc;

    fn file_unit<'a>(tree: &'a crate::parsing::SyntaxTree, path: &'a str, id: u32) -> FileUnit<'a> {
        FileUnit { file_id: FileId(id), relative_path: path, tree }
    }

    #[test]
    fn scenario_s2_three_file_cycle_detected_once() {
        let a_tree = parse(Arc::from("class A: C {}\n")).unwrap();
        let b_tree = parse(Arc::from("class B: A {}\n")).unwrap();
        let c_tree = parse(Arc::from("class C: B {}\n")).unwrap();

        let a_facts = collect_file(&a_tree, Arc::from("App"), "A.swift", FileId(1));
        let b_facts = collect_file(&b_tree, Arc::from("App"), "B.swift", FileId(2));
        let c_facts = collect_file(&c_tree, Arc::from("App"), "C.swift", FileId(3));
        let graph = GlobalReferenceGraph::build(vec![a_facts, b_facts, c_facts]);

        let files = vec![file_unit(&a_tree, "A.swift", 1), file_unit(&b_tree, "B.swift", 2), file_unit(&c_tree, "C.swift", 3)];
        let context = RuleContext {
            project_root: Path::new("."),
            settings: RuleSettings::default(),
            graph: Some(&graph),
            cancellation: CancellationToken::new(),
        };
        let violations = ReferenceCycleRule.analyze_all(&files, &graph, &context);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("A"));
        assert!(violations[0].message.contains("B"));
        assert!(violations[0].message.contains("C"));
    }

    #[test]
    fn acyclic_types_produce_no_violation() {
        let a_tree = parse(Arc::from("class A {}\n")).unwrap();
        let b_tree = parse(Arc::from("class B: A {}\n")).unwrap();
        let a_facts = collect_file(&a_tree, Arc::from("App"), "A.swift", FileId(1));
        let b_facts = collect_file(&b_tree, Arc::from("App"), "B.swift", FileId(2));
        let graph = GlobalReferenceGraph::build(vec![a_facts, b_facts]);
        let files = vec![file_unit(&a_tree, "A.swift", 1), file_unit(&b_tree, "B.swift", 2)];
        let context = RuleContext {
            project_root: Path::new("."),
            settings: RuleSettings::default(),
            graph: Some(&graph),
            cancellation: CancellationToken::new(),
        };
        let violations = ReferenceCycleRule.analyze_all(&files, &graph, &context);
        assert!(violations.is_empty());
    }
}
