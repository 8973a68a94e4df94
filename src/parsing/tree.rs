//! Immutable syntax tree wrapper.

use std::sync::Arc;
use tree_sitter::{Node, Tree};

#[derive(Debug, Clone)]
pub struct SyntaxTree {
    tree: Arc<Tree>,
    source: Arc<str>,
}

impl SyntaxTree {
    pub fn new(tree: Tree, source: Arc<str>) -> Self {
        Self {
            tree: Arc::new(tree),
            source,
        }
    }

    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn text(&self, node: Node<'_>) -> &str {
        &self.source[node.byte_range()]
    }

    /// Parsing never aborts on malformed input; error nodes are annotated
    /// and skipped by downstream collectors. This exposes whether any were
    /// produced, for the `parse.error` synthetic diagnostic.
    pub fn has_error(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Byte offset of the first error node, if any, for the synthetic
    /// `parse.error` diagnostic location.
    pub fn first_error_offset(&self) -> Option<u32> {
        fn find(node: Node<'_>) -> Option<u32> {
            if node.is_error() || node.is_missing() {
                return Some(node.start_byte() as u32);
            }
            let mut cursor = node.walk();
            if cursor.goto_first_child() {
                loop {
                    if let Some(offset) = find(cursor.node()) {
                        return Some(offset);
                    }
                    if !cursor.goto_next_sibling() {
                        break;
                    }
                }
            }
            None
        }
        find(self.tree.root_node())
    }
}
