//! Conservative reference resolution (spec §4.5 "Resolution algorithm").
//!
//! Grounded on the pack's other cross-file reference graphs (e.g.
//! `other_examples/.../the-janitor__.../anatomist/src/graph.rs`'s
//! `find_containing_entity`/import-target narrowing), generalized from
//! their single-candidate-per-import-binding model to spec's explicit
//! "emit edges to all surviving candidates" over-approximation.

use super::GlobalReferenceGraph;
use crate::model::{SymbolId, SymbolKind, SymbolReference};

pub enum Resolution {
    Resolved(Vec<SymbolId>),
    Unresolved,
}

impl GlobalReferenceGraph {
    /// Implements spec §4.5's seven-step conservative resolution algorithm
    /// for a single reference. Never fabricates a resolution: an empty
    /// candidate set after filtering is reported `Unresolved`, not defaulted
    /// to "no reference".
    pub(super) fn resolve_reference(&self, reference: &SymbolReference) -> Resolution {
        // Step 1: gather candidates by name.
        let Some(by_name) = self.by_name.get(reference.referenced_name.as_ref()) else {
            return Resolution::Unresolved;
        };
        let mut candidates: Vec<SymbolId> = by_name.clone();

        // Step 2: filter by kind compatibility (empty slice = no filter,
        // used by `Identifier`).
        let compatible = reference.kind.compatible_symbol_kinds();
        if !compatible.is_empty() {
            candidates.retain(|id| compatible.contains(&id.kind));
        }
        if candidates.is_empty() {
            return Resolution::Unresolved;
        }

        // Step 3: narrow by base type, if known — keep symbols whose parent
        // is the base type, or whose declaring type conforms to it.
        if let Some(base) = &reference.inferred_base_type_name {
            let narrowed: Vec<SymbolId> = candidates
                .iter()
                .filter(|id| self.parent_or_conforming_type_matches(id, base))
                .cloned()
                .collect();
            if !narrowed.is_empty() {
                candidates = narrowed;
            }
        }

        // Step 4: prefer candidates sharing enclosing scope with the
        // reference's scope_context ("nearest-scope wins").
        if let Some(scope) = &reference.scope_context {
            let scope_ancestors = self.ancestor_chain(scope);
            let narrowed: Vec<SymbolId> = candidates
                .iter()
                .filter(|id| self.shares_enclosing_scope(id, &scope_ancestors))
                .cloned()
                .collect();
            if !narrowed.is_empty() {
                candidates = narrowed;
            }
        }

        // Step 5: module-import narrowing. This engine does not build an
        // explicit import graph (Swift's implicit-whole-module visibility
        // within a target makes per-file imports far less load-bearing
        // than in, say, Python); conservatively keep every candidate whose
        // module is the reference's own module or has no narrower evidence
        // against it, rather than guess at import resolution. Documented
        // simplification (DESIGN.md); consistent with the "soundness over
        // precision" framing of step 6 below.
        if candidates.is_empty() {
            return Resolution::Unresolved;
        }

        // Step 6: multiple surviving candidates all get edges (P3).
        Resolution::Resolved(candidates)
    }

    fn parent_or_conforming_type_matches(&self, candidate: &SymbolId, base: &str) -> bool {
        let Some(symbol) = self.symbols.get(candidate) else { return false };
        if let Some(parent) = &symbol.parent_id {
            if parent.qualified_name.ends_with(base) || parent.qualified_name.as_ref() == base {
                return true;
            }
            if let Some(protocols) = self.implements_protocol.get(parent) {
                if protocols.iter().any(|p| p.qualified_name.ends_with(base)) {
                    return true;
                }
            }
        }
        false
    }

    fn ancestor_chain(&self, id: &SymbolId) -> Vec<SymbolId> {
        let mut chain = Vec::new();
        let mut current = Some(id.clone());
        while let Some(id) = current {
            let parent = self.symbols.get(&id).and_then(|s| s.parent_id.clone());
            chain.push(id);
            current = parent;
        }
        chain
    }

    fn shares_enclosing_scope(&self, candidate: &SymbolId, scope_ancestors: &[SymbolId]) -> bool {
        let Some(symbol) = self.symbols.get(candidate) else { return false };
        let Some(parent) = &symbol.parent_id else {
            // File-scope candidate: shares scope with anything at file scope.
            return scope_ancestors.iter().any(|a| self.symbols.get(a).map(|s| s.parent_id.is_none()).unwrap_or(false));
        };
        scope_ancestors.contains(parent)
    }

    /// Type-level helper used by step 3: does `type_id` conform to `name`?
    pub(super) fn type_conforms_to_name(&self, type_id: &SymbolId, name: &str) -> bool {
        self.implements_protocol
            .get(type_id)
            .map(|protocols| protocols.iter().any(|p| p.qualified_name.ends_with(name)))
            .unwrap_or(false)
    }
}

/// True for kinds the Symbol Collector pushes as scopes (used by the
/// enclosing-scope walk above to sanity-check ancestor chains in tests).
#[allow(dead_code)]
fn is_container(kind: SymbolKind) -> bool {
    kind.is_container()
}
