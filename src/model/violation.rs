//! Diagnostics emitted by rules (spec §3 "Violation (V)").

use super::symbol::ByteRange;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Hint,
    Suggestion,
    Warning,
    Error,
}

impl Severity {
    pub fn letter(self) -> &'static str {
        match self {
            Self::Error => "E",
            Self::Warning => "W",
            Self::Suggestion | Self::Hint => "S",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Suggestion => "suggestion",
            Self::Hint => "hint",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// spec §4.7: confidence maps to severity unless overridden.
    pub fn default_severity(self) -> Severity {
        match self {
            Self::High => Severity::Error,
            Self::Medium => Severity::Warning,
            Self::Low => Severity::Hint,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditKind {
    Replace,
    Insert,
    Remove,
    AddAnnotation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredEdit {
    pub range: ByteRange,
    pub replacement: Arc<str>,
    pub confidence: Confidence,
    pub kind: EditKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: Arc<str>,
    pub category: Arc<str>,
    pub severity: Severity,
    pub file: PathBuf,
    pub location: Location,
    pub message: String,
    pub suggested_fixes: Vec<String>,
    pub structured_edits: Vec<StructuredEdit>,
    pub context: BTreeMap<String, String>,
    /// Filled in by the Diagnostics Pipeline (§4.8); empty until then.
    pub fingerprint: String,
}

impl Violation {
    pub fn new(
        rule_id: impl Into<Arc<str>>,
        category: impl Into<Arc<str>>,
        severity: Severity,
        file: PathBuf,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            category: category.into(),
            severity,
            file,
            location,
            message: message.into(),
            suggested_fixes: Vec::new(),
            structured_edits: Vec::new(),
            context: BTreeMap::new(),
            fingerprint: String::new(),
        }
    }

    pub fn with_fix(mut self, description: impl Into<String>, edit: StructuredEdit) -> Self {
        self.suggested_fixes.push(description.into());
        self.structured_edits.push(edit);
        self
    }
}
