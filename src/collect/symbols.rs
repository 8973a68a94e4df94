//! Symbol Collector (C3, spec §4.3).
//!
//! Walks a file's `SyntaxTree` via the generic visitor, maintaining a
//! `scope_stack` of in-progress parent symbols. Container declarations
//! (type, extension, function, initializer, subscript, accessor) push a
//! scope; leaf declarations are emitted against the current top of stack.
//! Grounded on the node-kind knowledge already built into
//! `parsing::swift` (tree-sitter-swift collapses struct/class/enum/
//! extension into one `class_declaration` node, disambiguated by keyword).

use super::scope::ScopeTracker;
use super::{WhereClauseFact, WhereRequirementFact};
use crate::model::{Accessibility, Attribute, ByteRange, FileId, ModulePath, Symbol, SymbolId, SymbolKind};
use crate::parsing::swift::*;
use crate::parsing::{walk, SyntaxTree, VisitDecision, Visitor};
use std::collections::HashMap;
use std::sync::Arc;
use tree_sitter::Node;

pub struct SymbolCollector<'a> {
    tree: &'a SyntaxTree,
    file_id: FileId,
    scope: ScopeTracker,
    /// Whether each currently-open container actually pushed a scope frame;
    /// a declaration whose name couldn't be resolved never pushes, so its
    /// matching `post_visit` pop must be skipped.
    open_frames: Vec<bool>,
    symbols: Vec<Symbol>,
    by_name: HashMap<Arc<str>, Vec<SymbolId>>,
    where_clauses: Vec<WhereClauseFact>,
}

impl<'a> SymbolCollector<'a> {
    pub fn new(tree: &'a SyntaxTree, module: ModulePath, relative_path: &'a str, file_id: FileId) -> Self {
        Self {
            tree,
            file_id,
            scope: ScopeTracker::new(module, relative_path),
            open_frames: Vec::new(),
            symbols: Vec::new(),
            by_name: HashMap::new(),
            where_clauses: Vec::new(),
        }
    }

    pub fn collect(mut self) -> (Vec<Symbol>, HashMap<Arc<str>, Vec<SymbolId>>, Vec<WhereClauseFact>) {
        self.emit_top_level_symbol();
        let root = self.tree.root_node();
        walk(root, &mut self);
        (self.symbols, self.by_name, self.where_clauses)
    }

    /// Every file gets one `TopLevelCode` symbol so references emitted at
    /// file scope (outside any declaration) have a `scope_context` to
    /// anchor to; see `ScopeTracker::file_scope_id`.
    fn emit_top_level_symbol(&mut self) {
        let id = self.scope.file_scope_id();
        let symbol = Symbol {
            id: id.clone(),
            name: Arc::from("<top-level>"),
            qualified_name: id.qualified_name.clone(),
            kind: SymbolKind::TopLevelCode,
            parent_id: None,
            accessibility: Accessibility::Private,
            attributes: Vec::new(),
            defining_file: self.file_id,
            byte_range: ByteRange::new(0, 0),
        };
        self.by_name.entry(symbol.name.clone()).or_default().push(id);
        self.symbols.push(symbol);
    }

    fn accessibility_of(&self, node: Node<'_>) -> Accessibility {
        let source = self.tree.source();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "modifiers" {
                let mut mod_cursor = child.walk();
                for modifier in child.children(&mut mod_cursor) {
                    match &source[modifier.byte_range()] {
                        "private" => return Accessibility::Private,
                        "fileprivate" => return Accessibility::FilePrivate,
                        "internal" => return Accessibility::Internal,
                        "package" => return Accessibility::Package,
                        "public" => return Accessibility::Public,
                        "open" => return Accessibility::Open,
                        _ => {}
                    }
                }
            }
        }
        Accessibility::Internal
    }

    fn attributes_of(&self, node: Node<'_>) -> Vec<Attribute> {
        let source = self.tree.source();
        let mut attrs = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "attribute" {
                let text = &source[child.byte_range()];
                let name = text.trim_start_matches('@').split('(').next().unwrap_or(text);
                attrs.push(Attribute::bare(name.to_string()));
            }
        }
        attrs
    }

    fn declared_name<'b>(&self, node: Node<'b>) -> Option<&'b str> {
        let source = self.tree.source();
        node.child_by_field_name("name").map(|n| &source[n.byte_range()])
    }

    /// Emits a leaf symbol (no scope push), parented at the current stack top.
    fn record_leaf(&mut self, kind: SymbolKind, name: &str, node: Node<'_>) -> SymbolId {
        let qualified = self.scope.qualify(name);
        let byte_offset = node.start_byte() as u32;
        let id = SymbolId::new(
            self.scope.module().clone(),
            qualified.clone(),
            kind,
            self.scope.relative_path(),
            byte_offset,
            name,
        );
        let symbol = Symbol {
            id: id.clone(),
            name: Arc::from(name),
            qualified_name: qualified,
            kind,
            parent_id: self.scope.current(),
            accessibility: self.accessibility_of(node),
            attributes: self.attributes_of(node),
            defining_file: self.file_id,
            byte_range: ByteRange::new(node.start_byte() as u32, node.end_byte() as u32),
        };
        self.by_name.entry(symbol.name.clone()).or_default().push(id.clone());
        self.symbols.push(symbol);
        id
    }

    /// Pushes a container scope and records the matching `Symbol`; the
    /// qualified name is captured *before* the push so the symbol's own
    /// `qualified_name` reflects its parent's scope, not its own.
    fn enter_container(&mut self, kind: SymbolKind, name: &str, node: Node<'_>) {
        let qualified = self.scope.qualify(name);
        let accessibility = self.accessibility_of(node);
        let attributes = self.attributes_of(node);
        let byte_range = ByteRange::new(node.start_byte() as u32, node.end_byte() as u32);
        let parent_id = self.scope.current();
        let id = self.scope.push(kind, name, node.start_byte() as u32);
        let symbol = Symbol {
            id: id.clone(),
            name: Arc::from(name),
            qualified_name: qualified,
            kind,
            parent_id,
            accessibility,
            attributes,
            defining_file: self.file_id,
            byte_range,
        };
        self.by_name.entry(symbol.name.clone()).or_default().push(id);
        self.symbols.push(symbol);
        self.open_frames.push(true);
    }

    /// Pushes the synthetic extension symbol: members attach to it so
    /// they're discoverable via the extension; the Global Graph's "both"
    /// policy also surfaces them via `extends`.
    fn enter_extension(&mut self, extended_type_name: &str, node: Node<'_>) {
        let synthetic_name = format!("{extended_type_name}#extension");
        let attributes = vec![
            Attribute::bare("extension-target"),
            Attribute {
                name: Arc::from("extends"),
                arguments: vec![Arc::from(extended_type_name)],
            },
        ];
        let accessibility = self.accessibility_of(node);
        let byte_range = ByteRange::new(node.start_byte() as u32, node.end_byte() as u32);
        let qualified = self.scope.qualify(&synthetic_name);
        let parent_id = self.scope.current();
        let id = self.scope.push(SymbolKind::ExtensionMember, &synthetic_name, node.start_byte() as u32);
        let requirements = extract_where_requirements(self.tree.source(), node);
        if !requirements.is_empty() {
            self.where_clauses.push(WhereClauseFact {
                subject: id.clone(),
                extended_type_name: Arc::from(extended_type_name),
                requirements,
            });
        }
        let symbol = Symbol {
            id: id.clone(),
            name: Arc::from(synthetic_name.as_str()),
            qualified_name: qualified,
            kind: SymbolKind::ExtensionMember,
            parent_id,
            accessibility,
            attributes,
            defining_file: self.file_id,
            byte_range,
        };
        self.by_name.entry(symbol.name.clone()).or_default().push(id);
        self.symbols.push(symbol);
        self.open_frames.push(true);
    }

    fn in_extension(&self) -> bool {
        self.scope.in_extension()
    }
}

impl<'a> Visitor for SymbolCollector<'a> {
    fn pre_visit(&mut self, node: Node<'_>) -> VisitDecision {
        match node.kind() {
            CLASS_DECLARATION => {
                let source = self.tree.source();
                match (declaration_keyword(node, source), self.declared_name(node)) {
                    (Some("extension"), Some(name)) => self.enter_extension(name, node),
                    (Some("struct"), Some(name)) => self.enter_container(SymbolKind::Struct, name, node),
                    (Some("enum"), Some(name)) => self.enter_container(SymbolKind::Enum, name, node),
                    (Some("actor"), Some(name)) => self.enter_container(SymbolKind::ActorIsolatedType, name, node),
                    (_, Some(name)) => self.enter_container(SymbolKind::Class, name, node),
                    (_, None) => {}
                }
            }
            PROTOCOL_DECLARATION => {
                if let Some(name) = self.declared_name(node) {
                    self.enter_container(SymbolKind::Protocol, name, node);
                }
            }
            FUNCTION_DECLARATION => {
                if let Some(name) = self.declared_name(node) {
                    let kind = if self.scope.current().is_none() {
                        SymbolKind::Function
                    } else if self.in_extension() {
                        SymbolKind::ExtensionMember
                    } else {
                        SymbolKind::Method
                    };
                    self.enter_container(kind, name, node);
                }
            }
            INIT_DECLARATION => {
                let kind = if self.in_extension() { SymbolKind::ExtensionMember } else { SymbolKind::Initializer };
                self.enter_container(kind, "init", node);
            }
            DEINIT_DECLARATION => {
                let kind = if self.in_extension() { SymbolKind::ExtensionMember } else { SymbolKind::Deinitializer };
                self.enter_container(kind, "deinit", node);
            }
            SUBSCRIPT_DECLARATION => {
                let kind = if self.in_extension() { SymbolKind::ExtensionMember } else { SymbolKind::Subscript };
                self.enter_container(kind, "subscript", node);
            }
            PROPERTY_DECLARATION => {
                let source = self.tree.source();
                let in_ext = self.in_extension();
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if matches!(child.kind(), "pattern" | "value_binding_pattern") {
                        if let Some(ident) = find_first(child, SIMPLE_IDENTIFIER) {
                            let name = &source[ident.byte_range()];
                            let kind = if in_ext { SymbolKind::ExtensionMember } else { SymbolKind::PropertyOrVariable };
                            self.record_leaf(kind, name, node);
                        }
                    }
                }
            }
            TYPEALIAS_DECLARATION => {
                if let Some(name) = self.declared_name(node) {
                    self.record_leaf(SymbolKind::TypeAlias, name, node);
                }
            }
            ASSOCIATEDTYPE_DECLARATION => {
                if let Some(name) = self.declared_name(node) {
                    self.record_leaf(SymbolKind::AssociatedType, name, node);
                }
            }
            ENUM_ENTRY => {
                let source = self.tree.source();
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() == SIMPLE_IDENTIFIER {
                        let name = &source[child.byte_range()];
                        self.record_leaf(SymbolKind::EnumCase, name, node);
                    }
                }
            }
            OPERATOR_DECLARATION => {
                if let Some(name) = self.declared_name(node) {
                    self.record_leaf(SymbolKind::Operator, name, node);
                } else if let Some(op) = find_first(node, "custom_operator") {
                    let name = self.tree.source()[op.byte_range()].to_string();
                    self.record_leaf(SymbolKind::Operator, &name, node);
                }
            }
            PRECEDENCE_GROUP_DECLARATION => {
                if let Some(name) = self.declared_name(node) {
                    self.record_leaf(SymbolKind::PrecedenceGroup, name, node);
                }
            }
            "macro_declaration" => {
                if let Some(name) = self.declared_name(node) {
                    self.record_leaf(SymbolKind::Macro, name, node);
                }
            }
            _ => {}
        }
        VisitDecision::VisitChildren
    }

    fn post_visit(&mut self, node: Node<'_>) {
        let is_container_kind = matches!(
            node.kind(),
            CLASS_DECLARATION | PROTOCOL_DECLARATION | FUNCTION_DECLARATION | INIT_DECLARATION | DEINIT_DECLARATION | SUBSCRIPT_DECLARATION
        );
        if is_container_kind && self.open_frames.pop().unwrap_or(false) {
            self.scope.pop();
        }
    }
}

/// Lexically scans an extension's header (everything before its body's
/// opening `{`) for a `where <requirement>, <requirement>, ...` clause,
/// splitting each requirement on `==` (same-type) or `:` (conformance).
/// See `WhereClauseFact`'s doc comment for why this is lexical rather than
/// node-kind-based.
fn extract_where_requirements(source: &str, node: Node<'_>) -> Vec<WhereRequirementFact> {
    let full = &source[node.byte_range()];
    let header_end = full.find('{').unwrap_or(full.len());
    let header = &full[..header_end];
    let Some(where_pos) = find_word(header, "where") else { return Vec::new() };
    let clause_text = &header[where_pos + "where".len()..];
    clause_text
        .split(',')
        .filter_map(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            if let Some((lhs, rhs)) = raw.split_once("==") {
                Some(WhereRequirementFact::SameType {
                    type_param: Arc::from(lhs.trim()),
                    concrete_name: Arc::from(rhs.trim()),
                })
            } else if let Some((lhs, rhs)) = raw.split_once(':') {
                Some(WhereRequirementFact::Conformance {
                    type_param: Arc::from(lhs.trim()),
                    abstract_name: Arc::from(rhs.trim()),
                })
            } else {
                None
            }
        })
        .collect()
}

/// Finds `word` in `haystack` at a token boundary (not as a substring of a
/// longer identifier), e.g. so `whereable` never matches `where`.
fn find_word(haystack: &str, word: &str) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let mut start = 0;
    while let Some(rel) = haystack[start..].find(word) {
        let idx = start + rel;
        let before_ok = idx == 0 || {
            let c = bytes[idx - 1];
            !(c.is_ascii_alphanumeric() || c == b'_')
        };
        let after = idx + word.len();
        let after_ok = after >= bytes.len() || {
            let c = bytes[after];
            !(c.is_ascii_alphanumeric() || c == b'_')
        };
        if before_ok && after_ok {
            return Some(idx);
        }
        start = idx + word.len();
    }
    None
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::swift::parse;

    fn collect(source: &str) -> Vec<Symbol> {
        let tree = parse(Arc::from(source)).unwrap();
        let collector = SymbolCollector::new(&tree, Arc::from("App"), "App/A.swift", FileId(1));
        collector.collect().0
    }

    #[test]
    fn collects_struct_and_method() {
        let symbols = collect("struct Greeter {\n    func hello() {}\n}\n");
        assert!(symbols.iter().any(|s| s.name.as_ref() == "Greeter" && s.kind == SymbolKind::Struct));
        assert!(symbols.iter().any(|s| s.name.as_ref() == "hello" && s.kind == SymbolKind::Method));
    }

    #[test]
    fn top_level_function_is_function_not_method() {
        let symbols = collect("func standalone() {}\n");
        assert!(symbols.iter().any(|s| s.name.as_ref() == "standalone" && s.kind == SymbolKind::Function));
    }

    #[test]
    fn extension_members_get_extension_member_kind() {
        let symbols = collect("extension Int {\n    func double() -> Int { self * 2 }\n}\n");
        assert!(symbols.iter().any(|s| s.name.as_ref() == "double" && s.kind == SymbolKind::ExtensionMember));
        assert!(symbols.iter().any(|s| s.attributes.iter().any(|a| a.name.as_ref() == "extends")));
    }

    #[test]
    fn accessibility_defaults_to_internal() {
        let symbols = collect("struct S {}\n");
        let s = symbols.iter().find(|s| s.name.as_ref() == "S").unwrap();
        assert_eq!(s.accessibility, Accessibility::Internal);
    }

    #[test]
    fn public_modifier_is_parsed() {
        let symbols = collect("public struct S {}\n");
        let s = symbols.iter().find(|s| s.name.as_ref() == "S").unwrap();
        assert_eq!(s.accessibility, Accessibility::Public);
    }

    #[test]
    fn multi_binding_property_emits_one_symbol_per_name() {
        let symbols = collect("struct S {\n    let a, b: Int\n}\n");
        assert!(symbols.iter().any(|s| s.name.as_ref() == "a"));
        assert!(symbols.iter().any(|s| s.name.as_ref() == "b"));
    }

    #[test]
    fn nested_scope_produces_dotted_qualified_name() {
        let symbols = collect("struct Outer {\n    func inner() {}\n}\n");
        let method = symbols.iter().find(|s| s.name.as_ref() == "inner").unwrap();
        assert!(method.qualified_name.contains("Outer"));
    }
}
