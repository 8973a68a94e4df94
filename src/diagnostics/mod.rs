//! Diagnostics Pipeline (C8, spec §4.8): effective severity, baseline
//! suppression, minimum-severity filtering, deterministic sort, and the
//! three output renderers (`format.rs`).

pub mod fingerprint;
pub mod format;

pub use fingerprint::fingerprint;

use crate::model::{Baseline, Severity, Violation};
use crate::resolver::RuleSettings;
use crate::rules::registry::RuleMeta;
use std::collections::BTreeMap;
use std::path::Path;

pub struct PipelineOutcome {
    pub violations: Vec<Violation>,
    pub suppressed_by_baseline: usize,
}

/// Runs the five-step pipeline spec §4.8 describes. `resolve` is the same
/// (rule_id, relative_path) -> `RuleSettings` function used by the
/// Dispatcher (C10's `ConfigurationResolver::resolve`), so severity
/// overrides stay consistent between "did the rule run" and "at what
/// severity does it report".
pub fn process(
    mut violations: Vec<Violation>,
    rule_metas: &[RuleMeta],
    resolve: &(dyn Fn(&str, &Path) -> RuleSettings + Sync),
    baseline: Option<&Baseline>,
    min_severity: Severity,
    now_iso8601: &str,
) -> PipelineOutcome {
    let default_severity_by_id: BTreeMap<&str, Severity> = rule_metas.iter().map(|m| (m.id, m.default_severity)).collect();

    // 1. Effective severity.
    for violation in &mut violations {
        let resolved = resolve(violation.rule_id.as_ref(), violation.file.as_path());
        if let Some(severity) = resolved.severity {
            violation.severity = severity;
        } else if let Some(&default) = default_severity_by_id.get(violation.rule_id.as_ref()) {
            violation.severity = default;
        }
        violation.fingerprint = fingerprint(violation.rule_id.as_ref(), &violation.file.to_string_lossy(), violation.location.line, &violation.message);
    }

    // 2. Baseline suppression.
    let mut suppressed_by_baseline = 0usize;
    let baseline_active = baseline.map(|b| !b.is_expired(now_iso8601));
    if let (Some(baseline), Some(true)) = (baseline, baseline_active) {
        let before = violations.len();
        violations.retain(|v| !baseline.contains(&v.fingerprint));
        suppressed_by_baseline = before - violations.len();
    }

    // 3. Minimum severity filter.
    violations.retain(|v| v.severity >= min_severity);

    // 4. Deterministic sort by (file, line, column, rule id).
    violations.sort_by(|a, b| {
        (a.file.as_path(), a.location.line, a.location.column, a.rule_id.as_ref()).cmp(&(
            b.file.as_path(),
            b.location.line,
            b.location.column,
            b.rule_id.as_ref(),
        ))
    });

    PipelineOutcome { violations, suppressed_by_baseline }
}

/// Builds a fresh baseline from a violation set (the `baseline` verb,
/// spec §6): every current violation's fingerprint is recorded so a
/// subsequent `ci` run treats it as already known.
pub fn build_baseline(violations: &[Violation], created_iso8601: String, expires_iso8601: Option<String>) -> Baseline {
    let entries = violations
        .iter()
        .map(|v| crate::model::BaselineEntry {
            rule_id: v.rule_id.to_string(),
            file: v.file.to_string_lossy().to_string(),
            line: v.location.line,
            fingerprint: if v.fingerprint.is_empty() {
                fingerprint(v.rule_id.as_ref(), &v.file.to_string_lossy(), v.location.line, &v.message)
            } else {
                v.fingerprint.clone()
            },
        })
        .collect();
    Baseline::new(created_iso8601, expires_iso8601, entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BaselineEntry, Location};
    use crate::resolver::ParamValue;
    use std::collections::BTreeMap as Map;
    use std::path::PathBuf;

    fn violation(rule_id: &str, line: u32, severity: Severity) -> Violation {
        Violation::new(rule_id, "correctness", severity, PathBuf::from("A.swift"), Location { line, column: 1 }, "boom")
    }

    fn no_override(_: &str, _: &Path) -> RuleSettings {
        RuleSettings::default()
    }

    #[test]
    fn sorts_by_file_then_line_then_column_then_rule() {
        let violations = vec![violation("b_rule", 5, Severity::Warning), violation("a_rule", 1, Severity::Warning)];
        let metas = vec![];
        let outcome = process(violations, &metas, &no_override, None, Severity::Hint, "2026-01-01");
        assert_eq!(outcome.violations[0].rule_id.as_ref(), "a_rule");
    }

    #[test]
    fn min_severity_filters_lower_severities() {
        let violations = vec![violation("r", 1, Severity::Warning), violation("r", 2, Severity::Error)];
        let outcome = process(violations, &[], &no_override, None, Severity::Error, "2026-01-01");
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].severity, Severity::Error);
    }

    #[test]
    fn baseline_suppresses_known_fingerprint_unless_expired() {
        let v = violation("force_unwrap", 2, Severity::Error);
        let fp = fingerprint("force_unwrap", "A.swift", 2, "boom");
        let baseline = Baseline::new("2026-01-01".into(), None, vec![BaselineEntry { rule_id: "force_unwrap".into(), file: "A.swift".into(), line: 2, fingerprint: fp }]);
        let outcome = process(vec![v.clone()], &[], &no_override, Some(&baseline), Severity::Hint, "2026-01-02");
        assert!(outcome.violations.is_empty());
        assert_eq!(outcome.suppressed_by_baseline, 1);

        let expired = Baseline::new("2026-01-01".into(), Some("2026-01-01".into()), vec![]);
        let outcome2 = process(vec![v], &[], &no_override, Some(&expired), Severity::Hint, "2026-06-01");
        assert_eq!(outcome2.violations.len(), 1);
    }

    #[test]
    fn per_rule_severity_override_wins_over_rule_default() {
        let mut settings = RuleSettings::default();
        settings.severity = Some(Severity::Hint);
        let resolve = move |_id: &str, _path: &Path| -> RuleSettings {
            RuleSettings { enabled: settings.enabled, severity: settings.severity, parameters: Map::<String, ParamValue>::new() }
        };
        let violations = vec![violation("force_unwrap", 1, Severity::Error)];
        let outcome = process(violations, &[], &resolve, None, Severity::Hint, "2026-01-01");
        assert_eq!(outcome.violations[0].severity, Severity::Hint);
    }
}
