pub mod baseline;
pub mod edge;
pub mod ids;
pub mod reference;
pub mod symbol;
pub mod violation;

pub use baseline::{Baseline, BaselineEntry};
pub use edge::{ReferenceKindOrd, ResolvedEdge};
pub use ids::{location_digest, FileId, ModulePath, SymbolId};
pub use reference::{ReferenceKind, SymbolReference};
pub use symbol::{Accessibility, Attribute, ByteRange, Symbol, SymbolKind};
pub use violation::{Confidence, EditKind, Location, Severity, StructuredEdit, Violation};
