//! `force_unwrap`: flags a postfix force-unwrap (`expr!`) on an optional.
//!
//! A pinned scenario (`let x: Int? = 1\nlet y = x!\n`) must produce a
//! single `error`-severity violation at the line/column of the `!`, with
//! one suggested fix and one structured edit replacing the unwrapped
//! expression with a nil-coalesced default.
//!
//! Known simplification (documented, not silently approximated): this rule
//! scans the file's raw source text for the `<identifier>!` postfix pattern
//! rather than matching a tree-sitter-swift node kind. `parsing/swift.rs`'s
//! constants were grounded against this crate's `swift.rs`
//! declaration-node usage, but that file never exercises force-unwrap, so
//! no node kind for the postfix `!` operator was independently verified
//! against a real tree-sitter-swift grammar. A lexical scan gives the
//! exact byte offset the pinned scenario asks for without guessing at a
//! node kind that might not exist; `as!`/`try!` (different constructs,
//! prefixed by a keyword rather than a trailing operator) are excluded
//! explicitly.

use crate::model::{ByteRange, Confidence, EditKind, Location, Severity, StructuredEdit, Violation};
use crate::rules::registry::{FileLocalRule, FileUnit, RuleMeta};
use crate::rules::RuleContext;
use std::path::PathBuf;
use std::sync::Arc;

pub struct ForceUnwrapRule;

const KEYWORDS_EXCLUDED_BEFORE_BANG: &[&str] = &["as", "try"];

impl FileLocalRule for ForceUnwrapRule {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id: "force_unwrap",
            name: "Force unwrap",
            category: "correctness",
            default_severity: Severity::Error,
            enabled_by_default: true,
        }
    }

    fn analyze(&self, file: &FileUnit<'_>, _context: &RuleContext<'_>) -> Vec<Violation> {
        let source = file.tree.source();
        let bytes = source.as_bytes();
        let mut violations = Vec::new();

        let mut i = 0usize;
        while i < bytes.len() {
            if bytes[i] != b'!' {
                i += 1;
                continue;
            }
            // `!=`/`!==` are comparison operators, not a force-unwrap.
            if bytes.get(i + 1) == Some(&b'=') {
                i += 1;
                continue;
            }
            let Some(ident_start) = identifier_start(bytes, i) else {
                i += 1;
                continue;
            };
            let ident = &source[ident_start..i];
            if ident.is_empty() || KEYWORDS_EXCLUDED_BEFORE_BANG.contains(&ident) {
                i += 1;
                continue;
            }
            let (line, column) = line_column(source, i as u32);
            let replacement: Arc<str> = Arc::from(format!("{ident} ?? 0"));
            let edit = StructuredEdit {
                range: ByteRange::new(ident_start as u32, (i + 1) as u32),
                replacement,
                confidence: Confidence::High,
                kind: EditKind::Replace,
            };
            let violation = Violation::new(
                "force_unwrap",
                "correctness",
                Severity::Error,
                PathBuf::from(file.relative_path),
                Location { line, column },
                format!("force-unwrapping '{ident}' will crash if the value is nil"),
            )
            .with_fix(format!("use nil-coalescing: '{ident} ?? 0'"), edit);
            violations.push(violation);
            i += 1;
        }

        violations
    }
}

/// Walks backward from the `!` at `bang_index` over identifier characters
/// to find where the unwrapped expression's trailing identifier starts.
fn identifier_start(bytes: &[u8], bang_index: usize) -> Option<usize> {
    if bang_index == 0 {
        return None;
    }
    let mut start = bang_index;
    while start > 0 {
        let c = bytes[start - 1];
        if c.is_ascii_alphanumeric() || c == b'_' {
            start -= 1;
        } else {
            break;
        }
    }
    (start < bang_index).then_some(start)
}

fn line_column(source: &str, byte_offset: u32) -> (u32, u32) {
    let mut line = 1u32;
    let mut line_start = 0u32;
    for (offset, byte) in source.bytes().enumerate() {
        if offset as u32 >= byte_offset {
            break;
        }
        if byte == b'\n' {
            line += 1;
            line_start = offset as u32 + 1;
        }
    }
    (line, byte_offset - line_start + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileId;
    use crate::parsing::swift::parse;
    use crate::rules::context::CancellationToken;
    use crate::resolver::RuleSettings;
    use std::path::Path;

    fn analyze(source: &str) -> Vec<Violation> {
        let tree = parse(Arc::from(source)).unwrap();
        let file = FileUnit { file_id: FileId(1), relative_path: "A.swift", tree: &tree };
        let context = RuleContext {
            project_root: Path::new("."),
            settings: RuleSettings::default(),
            graph: None,
            cancellation: CancellationToken::new(),
        };
        ForceUnwrapRule.analyze(&file, &context)
    }

    #[test]
    fn scenario_s1_exact_location_and_fix() {
        let violations = analyze("let x: Int? = 1\nlet y = x!\n");
        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(v.rule_id.as_ref(), "force_unwrap");
        assert_eq!(v.severity, Severity::Error);
        assert_eq!(v.location.line, 2);
        // "let y = x!" -> '!' is the 10th byte (1-based column).
        assert_eq!(v.location.column, 10);
        assert_eq!(v.suggested_fixes.len(), 1);
        assert_eq!(v.structured_edits.len(), 1);
        assert_eq!(v.structured_edits[0].replacement.as_ref(), "x ?? 0");
    }

    #[test]
    fn not_equal_operator_is_not_flagged() {
        let violations = analyze("let ok = x != y\n");
        assert!(violations.is_empty());
    }

    #[test]
    fn try_bang_is_not_flagged() {
        let violations = analyze("let x = try! risky()\n");
        assert!(violations.is_empty());
    }
}
