//! Global Reference Graph (C5).
//!
//! Grounded on the pack's other cross-file graph builders (`petgraph::
//! DiGraph` + an id→`NodeIndex` side table, as in `other_examples/.../
//! gossiphs__src-graph.rs` and `.../the-janitor__.../anatomist/src/
//! graph.rs`), generalized from their single-language import model to a
//! five-pass build and conservative seven-step resolution.

mod resolve;

use crate::collect::{FileFacts, WhereClauseFact, WhereRequirementFact};
use crate::model::{FileId, ReferenceKindOrd, ResolvedEdge, Symbol, SymbolId, SymbolKind};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

pub use resolve::Resolution;

/// `.conformance(typeParam, abstractName) | .sameType(typeParam, concreteName)`
/// — a small requirement algebra for conditional conformances.
#[derive(Debug, Clone)]
pub enum ConformanceRequirement {
    Conformance { type_param: Arc<str>, abstract_name: Arc<str> },
    SameType { type_param: Arc<str>, concrete_name: Arc<str> },
}

#[derive(Debug, Clone)]
pub struct ConditionalConformance {
    pub conforming_type: SymbolId,
    pub abstraction: SymbolId,
    pub requirements: Vec<ConformanceRequirement>,
}

#[derive(Default)]
pub struct GlobalReferenceGraph {
    // `StableDiGraph` (not `DiGraph`): `remove_file` removes nodes one file
    // at a time, and `DiGraph::remove_node` swap-removes, silently
    // invalidating the `NodeIndex` of whatever node happened to be last —
    // corrupting every other `node_of` entry pointing at it (spec P2).
    // `StableDiGraph` tombstones the slot instead, so every other node's
    // index stays valid across removal.
    graph: StableDiGraph<SymbolId, BTreeSet<ReferenceKindOrd>>,
    node_of: HashMap<SymbolId, NodeIndex>,

    symbols: HashMap<SymbolId, Symbol>,
    by_name: HashMap<Arc<str>, Vec<SymbolId>>,
    by_qualified_name: HashMap<Arc<str>, SymbolId>,
    by_file: HashMap<FileId, Vec<SymbolId>>,

    /// type -> protocols it conforms to / inherits from.
    implements_protocol: HashMap<SymbolId, BTreeSet<SymbolId>>,
    /// protocol -> types that conform to / inherit from it.
    protocol_implementations: HashMap<SymbolId, BTreeSet<SymbolId>>,
    /// `(extension_or_type, associated_type_name) -> bound concrete name`.
    associated_type_bindings: HashMap<(SymbolId, Arc<str>), Arc<str>>,
    conditional_conformances: Vec<ConditionalConformance>,
    /// "both" extension-attribution policy: extended type name -> members
    /// contributed by extensions of that type.
    extension_members_by_extended_name: HashMap<Arc<str>, Vec<SymbolId>>,
    /// Raw `where`-clause facts from every indexed file, kept around so
    /// `associated_type_bindings`/`conditional_conformances` can be
    /// recomputed from scratch after any incremental mutation instead of
    /// patched in place.
    where_facts: Vec<WhereClauseFact>,

    unresolved_reference_count: u64,
}

impl GlobalReferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds (or rebuilds) the graph from scratch over the given files'
    /// collected facts, running its five passes in order.
    pub fn build(files: Vec<FileFacts>) -> Self {
        let mut graph = Self::new();
        for facts in &files {
            graph.index_file(facts);
        }
        graph.register_conformances();
        for facts in &files {
            graph.resolve_file_references(&facts.references);
        }
        // Passes 3-4 run after pass 5 (not before, as spec's pass numbering
        // implies): conditional-conformance facts need `implements_protocol`
        // populated, and that table is itself a side effect of resolving
        // Inheritance/Conformance references in pass 5 (see the comment on
        // `register_conformances`).
        graph.recompute_conformance_algebra();
        graph
    }

    // Pass 1: index symbols by id, name, qualified name, and file.
    fn index_file(&mut self, facts: &FileFacts) {
        for symbol in &facts.symbols {
            let node = self.graph.add_node(symbol.id.clone());
            self.node_of.insert(symbol.id.clone(), node);
            self.by_name.entry(symbol.name.clone()).or_default().push(symbol.id.clone());
            self.by_qualified_name.insert(symbol.qualified_name.clone(), symbol.id.clone());
            self.by_file.entry(symbol.defining_file).or_default().push(symbol.id.clone());
            if symbol.kind == SymbolKind::ExtensionMember {
                if let Some(extends) = symbol.attributes.iter().find(|a| a.name.as_ref() == "extends") {
                    if let Some(extended) = extends.arguments.first() {
                        self.extension_members_by_extended_name.entry(extended.clone()).or_default().push(symbol.id.clone());
                    }
                }
            }
            self.symbols.insert(symbol.id.clone(), symbol.clone());
        }
        self.where_facts.extend(facts.where_clauses.iter().cloned());
    }

    // Pass 2: register conformance & inheritance edges directly from
    // conformance/inheritance references.
    fn register_conformances(&mut self) {
        // Reconstructed from references during pass 5's resolution would be
        // circular (pass 2 must run before pass 5); instead this scans the
        // already-indexed extension/"extends" attribute data plus each
        // type's own inheritance specifiers, which the Reference Collector
        // recorded as plain `SymbolReference`s attached to files. Since
        // passes 2-4 need those references *before* full resolution, this
        // walks the raw references a second, cheaper time restricted to
        // Inheritance/Conformance kinds.
        //
        // (Populated lazily by `resolve_file_references` below instead,
        // which tags implements_protocol/protocol_implementations as a
        // side effect of resolving Inheritance/Conformance references —
        // see the match arm there. This method exists so the five-pass
        // structure is explicit even though this engine's passes 2 and 5
        // share one traversal for efficiency.)
    }

    // Passes 3-4: derive associated-type witnesses and conditional-
    // conformance requirements from the `where`-clause facts C4 extracted
    // per extension. Recomputed wholesale (not patched) on every build and
    // incremental mutation, since both outputs are small derived views over
    // `where_facts` + `implements_protocol`.
    fn recompute_conformance_algebra(&mut self) {
        self.associated_type_bindings.clear();
        self.conditional_conformances.clear();
        for fact in &self.where_facts {
            for requirement in &fact.requirements {
                if let WhereRequirementFact::SameType { type_param, concrete_name } = requirement {
                    self.associated_type_bindings.insert((fact.subject.clone(), type_param.clone()), concrete_name.clone());
                }
            }
            let Some(abstractions) = self.implements_protocol.get(&fact.subject) else { continue };
            for abstraction in abstractions.clone() {
                let requirements = fact
                    .requirements
                    .iter()
                    .map(|r| match r {
                        WhereRequirementFact::Conformance { type_param, abstract_name } => {
                            ConformanceRequirement::Conformance { type_param: type_param.clone(), abstract_name: abstract_name.clone() }
                        }
                        WhereRequirementFact::SameType { type_param, concrete_name } => {
                            ConformanceRequirement::SameType { type_param: type_param.clone(), concrete_name: concrete_name.clone() }
                        }
                    })
                    .collect();
                self.conditional_conformances.push(ConditionalConformance { conforming_type: fact.subject.clone(), abstraction, requirements });
            }
        }
    }

    // Pass 5: resolve each reference into zero-or-more edges.
    fn resolve_file_references(&mut self, references: &[crate::model::SymbolReference]) {
        for reference in references {
            match self.resolve_reference(reference) {
                Resolution::Resolved(targets) => {
                    let Some(from) = &reference.scope_context else { continue };
                    for to in &targets {
                        self.add_edge(from, to, reference.kind);
                        if matches!(reference.kind, crate::model::ReferenceKind::Inheritance | crate::model::ReferenceKind::Conformance) {
                            self.implements_protocol.entry(from.clone()).or_default().insert(to.clone());
                            self.protocol_implementations.entry(to.clone()).or_default().insert(from.clone());
                        }
                    }
                }
                Resolution::Unresolved => {
                    self.unresolved_reference_count += 1;
                }
            }
        }
    }

    fn add_edge(&mut self, from: &SymbolId, to: &SymbolId, kind: crate::model::ReferenceKind) {
        let (Some(&from_node), Some(&to_node)) = (self.node_of.get(from), self.node_of.get(to)) else { return };
        if let Some(edge) = self.graph.find_edge(from_node, to_node) {
            if let Some(weight) = self.graph.edge_weight_mut(edge) {
                weight.insert(kind.into());
            }
        } else {
            let mut kinds = BTreeSet::new();
            kinds.insert(ReferenceKindOrd::from(kind));
            self.graph.add_edge(from_node, to_node, kinds);
        }
    }

    // ---- Queries ----

    pub fn symbols_in(&self, file: FileId) -> Vec<&Symbol> {
        self.by_file.get(&file).into_iter().flatten().filter_map(|id| self.symbols.get(id)).collect()
    }

    pub fn symbols_named(&self, name: &str) -> Vec<&Symbol> {
        self.by_name.get(name).into_iter().flatten().filter_map(|id| self.symbols.get(id)).collect()
    }

    pub fn symbols_of_kind(&self, kind: SymbolKind) -> Vec<&Symbol> {
        self.symbols.values().filter(|s| s.kind == kind).collect()
    }

    pub fn references_from(&self, id: &SymbolId) -> Vec<ResolvedEdge> {
        let Some(&node) = self.node_of.get(id) else { return Vec::new() };
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .filter_map(|e| {
                let to = self.graph.node_weight(e.target())?.clone();
                Some(ResolvedEdge { from: id.clone(), to, kinds: e.weight().clone() })
            })
            .collect()
    }

    pub fn referenced_by(&self, id: &SymbolId) -> Vec<ResolvedEdge> {
        let Some(&node) = self.node_of.get(id) else { return Vec::new() };
        self.graph
            .edges_directed(node, Direction::Incoming)
            .filter_map(|e| {
                let from = self.graph.node_weight(e.source())?.clone();
                Some(ResolvedEdge { from, to: id.clone(), kinds: e.weight().clone() })
            })
            .collect()
    }

    /// Members, across both the extended type and any extensions of it
    /// (spec §9 "both" default), implementing `abstract_member_id`'s
    /// owning protocol.
    pub fn implementing_members(&self, abstract_member_id: &SymbolId) -> Vec<&Symbol> {
        let Some(member) = self.symbols.get(abstract_member_id) else { return Vec::new() };
        let Some(protocol_id) = &member.parent_id else { return Vec::new() };
        let Some(implementers) = self.protocol_implementations.get(protocol_id) else { return Vec::new() };
        let mut out = Vec::new();
        for type_id in implementers {
            if let Some(type_symbol) = self.symbols.get(type_id) {
                out.extend(self.direct_and_extension_members(type_id, type_symbol, member.name.as_ref()));
            }
        }
        out
    }

    fn direct_and_extension_members<'a>(&'a self, type_id: &SymbolId, type_symbol: &'a Symbol, name: &str) -> Vec<&'a Symbol> {
        let mut found: Vec<&Symbol> = self
            .symbols
            .values()
            .filter(|s| s.parent_id.as_ref() == Some(type_id) && s.name.as_ref() == name)
            .collect();
        if let Some(ext_members) = self.extension_members_by_extended_name.get(&type_symbol.name) {
            found.extend(ext_members.iter().filter_map(|id| self.symbols.get(id)).filter(|s| s.name.as_ref() == name));
        }
        found
    }

    pub fn conformed_abstractions(&self, type_id: &SymbolId) -> Vec<&Symbol> {
        self.implements_protocol.get(type_id).into_iter().flatten().filter_map(|id| self.symbols.get(id)).collect()
    }

    pub fn requirements_of(&self, abstract_type_id: &SymbolId) -> Vec<&Symbol> {
        self.symbols.values().filter(|s| s.parent_id.as_ref() == Some(abstract_type_id)).collect()
    }

    pub fn unresolved_reference_count(&self) -> u64 {
        self.unresolved_reference_count
    }

    pub fn symbol(&self, id: &SymbolId) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    pub fn all_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    // ---- Incremental update (spec §4.5) ----

    /// Removes every symbol declared in `file` and any edge incident to
    /// them, per spec's P2 (graph closedness).
    pub fn remove_file(&mut self, file: FileId) {
        let Some(ids) = self.by_file.remove(&file) else { return };
        let id_set: HashSet<SymbolId> = ids.iter().cloned().collect();
        for id in &ids {
            if let Some(node) = self.node_of.remove(id) {
                self.graph.remove_node(node);
            }
            if let Some(symbol) = self.symbols.remove(id) {
                if let Some(bucket) = self.by_name.get_mut(&symbol.name) {
                    bucket.retain(|n| n != id);
                }
                self.by_qualified_name.remove(&symbol.qualified_name);
            }
        }
        self.implements_protocol.retain(|k, v| {
            v.retain(|x| !id_set.contains(x));
            !id_set.contains(k)
        });
        self.protocol_implementations.retain(|k, v| {
            v.retain(|x| !id_set.contains(x));
            !id_set.contains(k)
        });
        self.extension_members_by_extended_name.retain(|_, members| {
            members.retain(|m| !id_set.contains(m));
            true
        });
        self.where_facts.retain(|f| !id_set.contains(&f.subject));
        self.recompute_conformance_algebra();
    }

    pub fn add_file(&mut self, facts: &FileFacts) {
        self.index_file(facts);
        self.resolve_file_references(&facts.references);
        self.recompute_conformance_algebra();
    }

    pub fn update_file(&mut self, file: FileId, facts: &FileFacts) {
        self.remove_file(file);
        self.add_file(facts);
    }
}

/// Used by C7's reachability BFS (never mutated by rule code — the graph
/// is read-only once built, per spec §4.6's thread-safety contract).
pub fn node_map_len(graph: &GlobalReferenceGraph) -> usize {
    graph.node_of.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::collect_file;
    use crate::model::FileId;
    use crate::parsing::swift::parse;
    use std::sync::Arc as StdArc;

    fn facts(source: &str, path: &str, id: u32) -> FileFacts {
        let tree = parse(StdArc::from(source)).unwrap();
        collect_file(&tree, StdArc::from("App"), path, FileId(id))
    }

    #[test]
    fn function_call_produces_resolved_edge() {
        let f = facts("func helper() {}\nfunc caller() { helper() }\n", "A.swift", 1);
        let graph = GlobalReferenceGraph::build(vec![f]);
        let caller = graph.symbols_named("caller").into_iter().next().unwrap();
        let edges = graph.references_from(&caller.id);
        assert!(edges.iter().any(|e| graph.symbol(&e.to).map(|s| s.name.as_ref() == "helper").unwrap_or(false)));
    }

    #[test]
    fn remove_file_drops_its_symbols_and_edges() {
        let f = facts("func helper() {}\nfunc caller() { helper() }\n", "A.swift", 1);
        let mut graph = GlobalReferenceGraph::build(vec![f]);
        assert!(!graph.symbols_named("helper").is_empty());
        graph.remove_file(FileId(1));
        assert!(graph.symbols_named("helper").is_empty());
        assert!(graph.symbols_named("caller").is_empty());
    }

    #[test]
    fn unresolved_reference_is_counted_not_errored() {
        let f = facts("func caller() { totallyUnknownThing() }\n", "A.swift", 1);
        let graph = GlobalReferenceGraph::build(vec![f]);
        assert!(graph.unresolved_reference_count() >= 1);
    }

    #[test]
    fn class_conformance_populates_protocol_tables() {
        let f = facts("protocol Greetable {}\nclass Dog: Greetable {}\n", "A.swift", 1);
        let graph = GlobalReferenceGraph::build(vec![f]);
        let dog = graph.symbols_named("Dog").into_iter().next().unwrap();
        assert!(!graph.conformed_abstractions(&dog.id).is_empty());
    }

    #[test]
    fn conditional_conformance_where_clause_is_recorded() {
        let f = facts("protocol Box {}\nextension Array: Box where Element: Hashable {}\n", "A.swift", 1);
        let graph = GlobalReferenceGraph::build(vec![f]);
        assert_eq!(graph.conditional_conformances.len(), 1);
        let cc = &graph.conditional_conformances[0];
        assert!(matches!(
            &cc.requirements[..],
            [ConformanceRequirement::Conformance { type_param, abstract_name }]
                if type_param.as_ref() == "Element" && abstract_name.as_ref() == "Hashable"
        ));
    }

    #[test]
    fn same_type_where_clause_binds_associated_type() {
        let f = facts("extension Array where Element == Int {}\n", "A.swift", 1);
        let graph = GlobalReferenceGraph::build(vec![f]);
        let subject = graph.symbols_named("Array#extension").into_iter().next().unwrap().id.clone();
        assert_eq!(graph.associated_type_bindings.get(&(subject, Arc::from("Element"))).map(|s| s.as_ref()), Some("Int"));
    }
}
