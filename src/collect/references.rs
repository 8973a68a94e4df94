//! Reference Collector (C4, spec §4.4).
//!
//! A second, independent walker over the same `SyntaxTree` recording
//! unresolved usage sites. Uses the same `ScopeTracker` logic as the Symbol
//! Collector so a `scope_context` id this collector emits is bitwise
//! identical to the `SymbolID` the Symbol Collector gave that declaration.

use super::scope::ScopeTracker;
use crate::model::{ModulePath, ReferenceKind, SymbolReference};
use crate::parsing::swift::*;
use crate::parsing::{walk, SyntaxTree, VisitDecision, Visitor};
use std::collections::HashSet;
use std::sync::Arc;
use tree_sitter::Node;

/// Built-in/primitive names skipped per spec §4.4 ("from a configurable
/// allow-list"); this is the engine's default list.
const DEFAULT_BUILTIN_TYPES: &[&str] = &[
    "Int", "Int8", "Int16", "Int32", "Int64", "UInt", "UInt8", "UInt16", "UInt32", "UInt64", "Float", "Double",
    "Bool", "String", "Character", "Array", "Dictionary", "Set", "Optional", "Void", "Any", "AnyObject",
];

/// Tracks whether the innermost open type declaration is a `class` (so its
/// first inheritance specifier is a superclass reference) or something
/// else (struct/enum/protocol/extension, where every specifier is a
/// conformance). Swift syntax does not otherwise distinguish the two.
struct TypeContext {
    is_class: bool,
    seen_inheritance_specifier: bool,
}

pub struct ReferenceCollector<'a> {
    tree: &'a SyntaxTree,
    scope: ScopeTracker,
    type_context_stack: Vec<TypeContext>,
    open_frames: Vec<bool>,
    builtin_types: HashSet<&'static str>,
    /// Byte offsets already accounted for by a specific handler (a call's
    /// callee, a declaration's own name, an inheritance specifier's type),
    /// so the generic bare-identifier / bare-type fallback doesn't also
    /// emit a duplicate, less specific reference for the same node.
    accounted_for: HashSet<u32>,
    references: Vec<SymbolReference>,
}

impl<'a> ReferenceCollector<'a> {
    pub fn new(tree: &'a SyntaxTree, module: ModulePath, relative_path: &'a str) -> Self {
        Self {
            tree,
            scope: ScopeTracker::new(module, relative_path),
            type_context_stack: Vec::new(),
            open_frames: Vec::new(),
            builtin_types: DEFAULT_BUILTIN_TYPES.iter().copied().collect(),
            accounted_for: HashSet::new(),
            references: Vec::new(),
        }
    }

    pub fn collect(mut self) -> Vec<SymbolReference> {
        let root = self.tree.root_node();
        walk(root, &mut self);
        self.references
    }

    fn text(&self, node: Node<'_>) -> &str {
        self.tree.text(node)
    }

    fn mark_accounted(&mut self, node: Node<'_>) {
        self.accounted_for.insert(node.start_byte() as u32);
    }

    fn is_accounted(&self, node: Node<'_>) -> bool {
        self.accounted_for.contains(&(node.start_byte() as u32))
    }

    fn emit(&mut self, name: &str, full_expression: &str, kind: ReferenceKind, node: Node<'_>, base_type: Option<&str>) {
        // A reference at file scope (outside any declaration) has no
        // enclosing symbol; anchor it to the file's synthetic top-level
        // symbol instead of dropping it (spec §4.7: top-level statements in
        // `main.*` must propagate liveness to what they call).
        let scope_context = self.scope.current().or_else(|| Some(self.scope.file_scope_id()));
        self.references.push(SymbolReference {
            referenced_name: Arc::from(name),
            full_expression: Arc::from(full_expression),
            kind,
            byte_offset: node.start_byte() as u32,
            scope_context,
            inferred_base_type_name: base_type.map(Arc::from),
        });
    }

    /// The bare name of a `user_type` node, stripping any generic argument
    /// clause (e.g. `Array<Int>` -> `Array`).
    fn type_name<'b>(&self, node: Node<'b>) -> &'b str {
        let source = self.tree.source();
        node.child_by_field_name("name")
            .map(|n| &source[n.byte_range()])
            .unwrap_or_else(|| &source[node.byte_range()])
    }

    fn is_generic_argument(&self, node: Node<'_>) -> bool {
        node.parent().map(|p| p.kind() == "type_arguments" || p.kind() == "type_parameters").unwrap_or(false)
    }

    /// Handles a `call_expression`'s callee, distinguishing an initializer
    /// call from a function call via the capitalization heuristic spec
    /// §4.4/§9 mandates (never refine with real type resolution here).
    fn handle_call(&mut self, node: Node<'_>) {
        let Some(callee) = node.child_by_field_name("function") else { return };
        let full_expression = self.text(node).to_string();
        match callee.kind() {
            SIMPLE_IDENTIFIER => {
                let name = self.text(callee).to_string();
                self.mark_accounted(callee);
                let kind = if is_initializer_heuristic(&name) { ReferenceKind::Initializer } else { ReferenceKind::FunctionCall };
                self.emit(&name, &full_expression, kind, node, None);
            }
            NAVIGATION_EXPRESSION => {
                if let Some((base, suffix_node, suffix_name)) = self.split_navigation(callee) {
                    self.mark_accounted(suffix_node);
                    let kind = if is_initializer_heuristic(&suffix_name) { ReferenceKind::Initializer } else { ReferenceKind::FunctionCall };
                    self.emit(&suffix_name, &full_expression, kind, node, base.as_deref());
                }
            }
            _ => {}
        }
    }

    /// Splits `a.b` into (base name if simple, suffix node, suffix name).
    fn split_navigation(&self, node: Node<'_>) -> Option<(Option<String>, Node<'_>, String)> {
        let suffix = node.child_by_field_name("suffix").or_else(|| {
            let mut cursor = node.walk();
            node.children(&mut cursor).last()
        })?;
        if suffix.kind() != SIMPLE_IDENTIFIER {
            return None;
        }
        let suffix_name = self.text(suffix).to_string();
        let base = node.child_by_field_name("target").or_else(|| node.named_child(0));
        let base_name = base.filter(|b| b.kind() == SIMPLE_IDENTIFIER).map(|b| self.text(b).to_string());
        let is_implicit_member = base.is_none();
        if is_implicit_member {
            // Recorded by the caller as a dot-prefixed shorthand (`.red`);
            // signalled by returning base=None.
        }
        Some((base_name, suffix, suffix_name))
    }

    fn handle_navigation(&mut self, node: Node<'_>) {
        if self.is_accounted(node) {
            return;
        }
        let Some((base, suffix_node, suffix_name)) = self.split_navigation(node) else { return };
        if self.is_accounted(suffix_node) {
            return;
        }
        self.mark_accounted(suffix_node);
        let full_expression = self.text(node).to_string();
        let has_explicit_base = node.child_by_field_name("target").is_some() || node.named_child(0).is_some();
        let kind = if base.is_none() && !has_explicit_base {
            // `.caseName` implicit-member shorthand: idiomatically an enum
            // case or static member reference.
            ReferenceKind::EnumCase
        } else {
            ReferenceKind::PropertyAccess
        };
        self.emit(&suffix_name, &full_expression, kind, node, base.as_deref());
    }

    fn handle_user_type(&mut self, node: Node<'_>) {
        if self.is_accounted(node) {
            return;
        }
        let name = self.type_name(node).to_string();
        if self.builtin_types.contains(name.as_str()) {
            return;
        }
        let full_expression = self.text(node).to_string();
        let kind = if self.is_generic_argument(node) { ReferenceKind::GenericArgument } else { ReferenceKind::TypeReference };
        self.emit(&name, &full_expression, kind, node, None);
    }

    fn handle_inheritance_specifier(&mut self, node: Node<'_>) {
        let Some(type_node) = find_first(node, TYPE_IDENTIFIER) else { return };
        self.mark_accounted(type_node);
        let name = self.type_name(type_node).to_string();
        let full_expression = self.text(type_node).to_string();
        let ctx = self.type_context_stack.last_mut();
        let kind = match ctx {
            Some(ctx) if ctx.is_class && !ctx.seen_inheritance_specifier => {
                ctx.seen_inheritance_specifier = true;
                ReferenceKind::Inheritance
            }
            Some(ctx) => {
                ctx.seen_inheritance_specifier = true;
                ReferenceKind::Conformance
            }
            None => ReferenceKind::Conformance,
        };
        self.emit(&name, &full_expression, kind, type_node, None);
    }

    fn handle_bare_identifier(&mut self, node: Node<'_>) {
        if self.is_accounted(node) {
            return;
        }
        let name = self.text(node);
        if matches!(name, "self" | "super" | "Self" | "_") {
            return;
        }
        let name = name.to_string();
        let full_expression = name.clone();
        self.emit(&name, &full_expression, ReferenceKind::Identifier, node, None);
    }
}

fn is_initializer_heuristic(name: &str) -> bool {
    name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}

fn find_first<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == kind {
            return Some(child);
        }
        if let Some(found) = find_first(child, kind) {
            return Some(found);
        }
    }
    None
}

impl<'a> Visitor for ReferenceCollector<'a> {
    fn pre_visit(&mut self, node: Node<'_>) -> VisitDecision {
        match node.kind() {
            CLASS_DECLARATION => {
                let source = self.tree.source();
                let keyword = declaration_keyword(node, source);
                if keyword == Some("extension") {
                    if let Some(name) = node.child_by_field_name("name").map(|n| &source[n.byte_range()]) {
                        self.mark_accounted(node);
                        self.emit(name, name, ReferenceKind::ExtensionTarget, node, None);
                        let _ = self.scope.push(crate::model::SymbolKind::ExtensionMember, &format!("{name}#extension"), node.start_byte() as u32);
                        self.open_frames.push(true);
                        self.type_context_stack.push(TypeContext { is_class: false, seen_inheritance_specifier: false });
                        return VisitDecision::VisitChildren;
                    }
                }
                if let Some(name) = node.child_by_field_name("name").map(|n| &source[n.byte_range()]) {
                    self.mark_accounted(node);
                    let kind = match keyword {
                        Some("struct") => crate::model::SymbolKind::Struct,
                        Some("enum") => crate::model::SymbolKind::Enum,
                        Some("actor") => crate::model::SymbolKind::ActorIsolatedType,
                        _ => crate::model::SymbolKind::Class,
                    };
                    self.scope.push(kind, name, node.start_byte() as u32);
                    self.open_frames.push(true);
                    self.type_context_stack.push(TypeContext { is_class: keyword == Some("class"), seen_inheritance_specifier: false });
                } else {
                    self.open_frames.push(false);
                }
            }
            PROTOCOL_DECLARATION => {
                let source = self.tree.source();
                if let Some(name) = node.child_by_field_name("name").map(|n| &source[n.byte_range()]) {
                    self.scope.push(crate::model::SymbolKind::Protocol, name, node.start_byte() as u32);
                    self.open_frames.push(true);
                    self.type_context_stack.push(TypeContext { is_class: false, seen_inheritance_specifier: false });
                } else {
                    self.open_frames.push(false);
                }
            }
            FUNCTION_DECLARATION => {
                let source = self.tree.source();
                if let Some(name) = node.child_by_field_name("name").map(|n| &source[n.byte_range()]) {
                    let kind = if self.scope.current().is_none() {
                        crate::model::SymbolKind::Function
                    } else if self.scope.in_extension() {
                        crate::model::SymbolKind::ExtensionMember
                    } else {
                        crate::model::SymbolKind::Method
                    };
                    self.scope.push(kind, name, node.start_byte() as u32);
                    self.open_frames.push(true);
                } else {
                    self.open_frames.push(false);
                }
            }
            INIT_DECLARATION => {
                self.scope.push(crate::model::SymbolKind::Initializer, "init", node.start_byte() as u32);
                self.open_frames.push(true);
            }
            DEINIT_DECLARATION => {
                self.scope.push(crate::model::SymbolKind::Deinitializer, "deinit", node.start_byte() as u32);
                self.open_frames.push(true);
            }
            SUBSCRIPT_DECLARATION => {
                self.scope.push(crate::model::SymbolKind::Subscript, "subscript", node.start_byte() as u32);
                self.open_frames.push(true);
            }
            INHERITANCE_SPECIFIER => self.handle_inheritance_specifier(node),
            CALL_EXPRESSION => self.handle_call(node),
            NAVIGATION_EXPRESSION => self.handle_navigation(node),
            TYPE_IDENTIFIER => self.handle_user_type(node),
            SIMPLE_IDENTIFIER => self.handle_bare_identifier(node),
            _ => {}
        }
        VisitDecision::VisitChildren
    }

    fn post_visit(&mut self, node: Node<'_>) {
        let is_type_decl = matches!(node.kind(), CLASS_DECLARATION | PROTOCOL_DECLARATION);
        let is_scoped = matches!(
            node.kind(),
            CLASS_DECLARATION | PROTOCOL_DECLARATION | FUNCTION_DECLARATION | INIT_DECLARATION | DEINIT_DECLARATION | SUBSCRIPT_DECLARATION
        );
        if is_scoped {
            if self.open_frames.pop().unwrap_or(false) {
                self.scope.pop();
            }
        }
        if is_type_decl && !self.type_context_stack.is_empty() {
            // Only pop when this node actually pushed a context (guarded by
            // open_frames above sharing the same predicate for these kinds).
            self.type_context_stack.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::swift::parse;

    fn collect(source: &str) -> Vec<SymbolReference> {
        let tree = parse(Arc::from(source)).unwrap();
        ReferenceCollector::new(&tree, Arc::from("App"), "App/A.swift").collect()
    }

    #[test]
    fn plain_function_call_is_function_call_kind() {
        let refs = collect("func f() { helper() }\n");
        assert!(refs.iter().any(|r| r.referenced_name.as_ref() == "helper" && r.kind == ReferenceKind::FunctionCall));
    }

    #[test]
    fn capitalized_call_is_initializer_heuristic() {
        let refs = collect("func f() { let x = Widget() }\n");
        assert!(refs.iter().any(|r| r.referenced_name.as_ref() == "Widget" && r.kind == ReferenceKind::Initializer));
    }

    #[test]
    fn builtin_type_name_is_skipped() {
        let refs = collect("func f(x: Int) {}\n");
        assert!(!refs.iter().any(|r| r.referenced_name.as_ref() == "Int"));
    }

    #[test]
    fn class_superclass_is_inheritance_protocol_is_conformance() {
        let refs = collect("class Dog: Animal, Named {}\n");
        let superclass = refs.iter().find(|r| r.referenced_name.as_ref() == "Animal").unwrap();
        assert_eq!(superclass.kind, ReferenceKind::Inheritance);
        let protocol = refs.iter().find(|r| r.referenced_name.as_ref() == "Named").unwrap();
        assert_eq!(protocol.kind, ReferenceKind::Conformance);
    }

    #[test]
    fn self_and_super_are_excluded() {
        let refs = collect("class C { func f() { self.g() } }\n");
        assert!(!refs.iter().any(|r| r.referenced_name.as_ref() == "self"));
    }

    #[test]
    fn extension_emits_extension_target_reference() {
        let refs = collect("extension Int {\n    func double() -> Int { self * 2 }\n}\n");
        assert!(refs.iter().any(|r| r.referenced_name.as_ref() == "Int" && r.kind == ReferenceKind::ExtensionTarget));
    }
}
