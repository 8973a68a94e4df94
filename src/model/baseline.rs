//! Persisted baseline of suppressed diagnostics (spec §3/§6 "Baseline (B)").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BaselineEntry {
    pub rule_id: String,
    pub file: String,
    pub line: u32,
    pub fingerprint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Baseline {
    pub version: u32,
    /// ISO-8601.
    pub created: String,
    /// ISO-8601, optional.
    pub expires: Option<String>,
    pub violations: Vec<BaselineEntry>,
}

impl Baseline {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(created: String, expires: Option<String>, mut violations: Vec<BaselineEntry>) -> Self {
        // spec §6: "sorted by (file, line, rule_id)" — not derived field
        // order, which would sort by rule_id first.
        violations.sort_by(|a, b| (&a.file, a.line, &a.rule_id).cmp(&(&b.file, b.line, &b.rule_id)));
        Self {
            version: Self::CURRENT_VERSION,
            created,
            expires,
            violations,
        }
    }

    /// spec §7: malformed/version-mismatched baselines are treated as "no
    /// baseline" with a warning, never a fatal error.
    pub fn is_expired(&self, now_iso8601: &str) -> bool {
        match &self.expires {
            Some(expires) => now_iso8601 > expires.as_str(),
            None => false,
        }
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.violations.iter().any(|v| v.fingerprint == fingerprint)
    }
}
