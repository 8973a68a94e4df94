//! Output renderers for the three formats spec §6 names: human, JSON, and
//! the compact machine/agent JSON document.

use crate::model::{EditKind, Severity, Violation};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// `SEVERITY [category.rule_id]` block format (spec §6 "Human diagnostic
/// format").
pub fn render_human(violations: &[Violation]) -> String {
    let mut out = String::new();
    for v in violations {
        let _ = writeln!(out, "{} [{}.{}]", v.severity.label().to_uppercase(), v.category, v.rule_id);
        let _ = writeln!(out, "  {}", v.message);
        let _ = writeln!(out, "  File: {}:{}:{}", v.file.display(), v.location.line, v.location.column);
        if !v.suggested_fixes.is_empty() {
            let _ = writeln!(out, "  Suggested fixes:");
            for fix in &v.suggested_fixes {
                let _ = writeln!(out, "    - {fix}");
            }
        }
    }
    out
}

#[derive(Serialize)]
struct JsonEdit {
    range: JsonRange,
    text: String,
}

#[derive(Serialize)]
struct JsonRange {
    sl: u32,
    sc: u32,
    el: u32,
    ec: u32,
}

#[derive(Serialize)]
struct JsonFix {
    desc: String,
    edits: Vec<JsonEdit>,
}

#[derive(Serialize)]
struct JsonViolation {
    id: String,
    sev: &'static str,
    file: String,
    line: u32,
    col: u32,
    msg: String,
    ctx: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fix: Option<JsonFix>,
}

#[derive(Serialize)]
struct JsonSummary {
    error: usize,
    warning: usize,
    suggestion: usize,
}

#[derive(Serialize)]
struct JsonDocument {
    version: &'static str,
    status: &'static str,
    summary: JsonSummary,
    violations: Vec<JsonViolation>,
}

/// The compact "machine (agent) diagnostic format" document from spec §6.
/// `source_line` supplies the `ctx` array (one entry: the flagged source
/// line), since `Violation` itself carries only byte ranges, not text.
pub fn render_agent_json(violations: &[Violation], source_line: impl Fn(&Violation) -> Option<String>) -> serde_json::Result<String> {
    let summary = JsonSummary {
        error: violations.iter().filter(|v| v.severity == Severity::Error).count(),
        warning: violations.iter().filter(|v| v.severity == Severity::Warning).count(),
        suggestion: violations.iter().filter(|v| matches!(v.severity, Severity::Suggestion | Severity::Hint)).count(),
    };
    let status = if violations.is_empty() { "ok" } else { "violations_found" };

    let json_violations = violations
        .iter()
        .map(|v| {
            let ctx = source_line(v).into_iter().collect();
            let fix = v.suggested_fixes.first().map(|desc| JsonFix {
                desc: desc.clone(),
                edits: v
                    .structured_edits
                    .iter()
                    .map(|edit| JsonEdit {
                        range: JsonRange { sl: v.location.line, sc: v.location.column, el: v.location.line, ec: v.location.column + edit.range.len() },
                        text: match edit.kind {
                            EditKind::Remove => String::new(),
                            _ => edit.replacement.to_string(),
                        },
                    })
                    .collect(),
            });
            JsonViolation {
                id: v.rule_id.to_string(),
                sev: v.severity.letter(),
                file: v.file.display().to_string(),
                line: v.location.line,
                col: v.location.column,
                msg: v.message.clone(),
                ctx,
                fix,
            }
        })
        .collect();

    let document = JsonDocument { version: "1.0", status, summary, violations: json_violations };
    serde_json::to_string_pretty(&document)
}

/// Plain JSON array of violations, for the generic (non-agent) `--format
/// json` output; each element mirrors `Violation`'s own field names.
pub fn render_json(violations: &[Violation]) -> serde_json::Result<String> {
    #[derive(Serialize)]
    struct PlainViolation<'a> {
        rule_id: &'a str,
        category: &'a str,
        severity: &'static str,
        file: String,
        line: u32,
        column: u32,
        message: &'a str,
        suggested_fixes: &'a [String],
        context: &'a BTreeMap<String, String>,
    }

    let plain: Vec<PlainViolation<'_>> = violations
        .iter()
        .map(|v| PlainViolation {
            rule_id: v.rule_id.as_ref(),
            category: v.category.as_ref(),
            severity: v.severity.label(),
            file: v.file.display().to_string(),
            line: v.location.line,
            column: v.location.column,
            message: &v.message,
            suggested_fixes: &v.suggested_fixes,
            context: &v.context,
        })
        .collect();
    serde_json::to_string_pretty(&plain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Location;
    use std::path::PathBuf;

    fn sample() -> Violation {
        Violation::new("force_unwrap", "correctness", Severity::Error, PathBuf::from("A.swift"), Location { line: 2, column: 11 }, "boom")
    }

    #[test]
    fn human_format_has_four_lines_without_fixes() {
        let out = render_human(&[sample()]);
        assert!(out.contains("ERROR [correctness.force_unwrap]"));
        assert!(out.contains("File: A.swift:2:11"));
        assert!(!out.contains("Suggested fixes"));
    }

    #[test]
    fn agent_json_status_reflects_emptiness() {
        let doc = render_agent_json(&[], |_| None).unwrap();
        assert!(doc.contains("\"status\": \"ok\""));
        let doc2 = render_agent_json(&[sample()], |_| None).unwrap();
        assert!(doc2.contains("\"status\": \"violations_found\""));
        assert!(doc2.contains("\"sev\": \"E\""));
    }
}
