//! Symbol representation (spec §3 "Symbol (S)").

use super::ids::{FileId, SymbolId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Class,
    Struct,
    Enum,
    Protocol,
    /// Actor / isolated-type: a reference type whose state is isolated to a
    /// single execution context.
    ActorIsolatedType,
    Function,
    Method,
    /// Property or local/global variable.
    PropertyOrVariable,
    Initializer,
    Deinitializer,
    Subscript,
    TypeAlias,
    AssociatedType,
    EnumCase,
    Operator,
    PrecedenceGroup,
    Macro,
    /// A member contributed by an `extension` block rather than the type's
    /// own primary declaration.
    ExtensionMember,
    /// Synthetic per-file symbol standing in for a file's top-level
    /// statements (spec §4.7: `**/main.*` top-level code is fully live in
    /// executable mode). Never emitted by source syntax directly; one is
    /// recorded per file so top-level references have somewhere to anchor
    /// their `scope_context` instead of being dropped.
    TopLevelCode,
}

impl SymbolKind {
    /// Container kinds that push a new scope onto the collector's stack.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            Self::Class
                | Self::Struct
                | Self::Enum
                | Self::Protocol
                | Self::ActorIsolatedType
                | Self::Function
                | Self::Method
                | Self::Initializer
                | Self::Deinitializer
                | Self::Subscript
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Protocol => "protocol",
            Self::ActorIsolatedType => "actor",
            Self::Function => "function",
            Self::Method => "method",
            Self::PropertyOrVariable => "property",
            Self::Initializer => "initializer",
            Self::Deinitializer => "deinitializer",
            Self::Subscript => "subscript",
            Self::TypeAlias => "type-alias",
            Self::AssociatedType => "associated-type",
            Self::EnumCase => "enum-case",
            Self::Operator => "operator",
            Self::PrecedenceGroup => "precedence-group",
            Self::Macro => "macro",
            Self::ExtensionMember => "extension-member",
            Self::TopLevelCode => "top-level-code",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Accessibility {
    Private,
    FilePrivate,
    Internal,
    Package,
    Public,
    Open,
}

impl Accessibility {
    /// spec §4.7 confidence mapping for the dead-code analyzer.
    pub fn dead_code_confidence(self) -> super::violation::Confidence {
        use super::violation::Confidence;
        match self {
            Self::Private | Self::FilePrivate => Confidence::High,
            Self::Internal | Self::Package => Confidence::Medium,
            Self::Public | Self::Open => Confidence::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: u32,
    pub end: u32,
}

impl ByteRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: Arc<str>,
    pub arguments: Vec<Arc<str>>,
}

impl Attribute {
    pub fn bare(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: Arc<str>,
    pub qualified_name: Arc<str>,
    pub kind: SymbolKind,
    pub parent_id: Option<SymbolId>,
    pub accessibility: Accessibility,
    pub attributes: Vec<Attribute>,
    pub defining_file: FileId,
    pub byte_range: ByteRange,
}

impl Symbol {
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name.as_ref() == name)
    }
}
