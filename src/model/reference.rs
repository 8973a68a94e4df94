//! Unresolved usage sites (spec §3 "Symbol Reference (R)").

use super::ids::SymbolId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    FunctionCall,
    PropertyAccess,
    TypeReference,
    Inheritance,
    Conformance,
    Identifier,
    ExtensionTarget,
    EnumCase,
    Initializer,
    GenericArgument,
}

impl ReferenceKind {
    /// spec §4.5 step 2: kind-compatible candidate symbol kinds.
    pub fn compatible_symbol_kinds(self) -> &'static [super::symbol::SymbolKind] {
        use super::symbol::SymbolKind::*;
        match self {
            Self::FunctionCall => &[Function, Method, Initializer],
            Self::PropertyAccess => &[PropertyOrVariable, Subscript, EnumCase],
            Self::TypeReference
            | Self::Inheritance
            | Self::Conformance
            | Self::ExtensionTarget => &[
                Class,
                Struct,
                Enum,
                Protocol,
                ActorIsolatedType,
                TypeAlias,
                AssociatedType,
            ],
            // Identifier matches everything; represented as an empty slice
            // with the caller treating that as "no filter".
            Self::Identifier => &[],
            Self::EnumCase => &[EnumCase],
            Self::Initializer => &[Initializer],
            Self::GenericArgument => &[
                Class,
                Struct,
                Enum,
                Protocol,
                ActorIsolatedType,
                TypeAlias,
                AssociatedType,
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolReference {
    pub referenced_name: Arc<str>,
    pub full_expression: Arc<str>,
    pub kind: ReferenceKind,
    pub byte_offset: u32,
    /// The symbol whose body this reference occurs inside. Always `Some`:
    /// a reference with no enclosing declaration is anchored to its file's
    /// synthetic `SymbolKind::TopLevelCode` symbol rather than `None`, so
    /// resolution never drops top-level statements.
    pub scope_context: Option<SymbolId>,
    pub inferred_base_type_name: Option<Arc<str>>,
}
