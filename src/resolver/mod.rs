//! Configuration Resolver (C10).
//!
//! Resolves a declared `Profile` plus a tree of overrides into effective
//! per-(rule, file) configuration. Operates purely on already-parsed
//! documents: YAML/profile-preset *parsing* is an external collaborator's
//! job — this module consumes `Profile`/`OverrideTree` values however
//! they were produced.
//!
//! Grounded on this crate's `config.rs` figment-layering *pattern*
//! (successive partial overlays, last non-null wins), adapted here from a
//! flat settings struct to a five-tier (rule × file) precedence chain,
//! since this is a genuinely different shape of problem than a single
//! process-wide settings blob.

mod param;

pub use param::ParamValue;

use crate::model::Severity;
use std::collections::BTreeMap;
use std::path::Path;

/// A category groups related rules (e.g. "dead-code", "style",
/// "correctness") for profile-level and user-level category overrides.
pub type Category = String;
pub type RuleId = String;

#[derive(Debug, Clone, Default)]
pub struct RuleSettings {
    pub enabled: Option<bool>,
    pub severity: Option<Severity>,
    pub parameters: BTreeMap<String, ParamValue>,
}

impl RuleSettings {
    /// Merges `other` over `self`: any field `other` sets wins, missing
    /// fields in `other` leave `self`'s value untouched — an override is a
    /// partial record, missing fields inherit.
    fn merged_with(mut self, other: &RuleSettings) -> Self {
        if let Some(enabled) = other.enabled {
            self.enabled = Some(enabled);
        }
        if let Some(severity) = other.severity {
            self.severity = Some(severity);
        }
        for (key, value) in &other.parameters {
            self.parameters.insert(key.clone(), value.clone());
        }
        self
    }
}

/// A preset bundle of per-category and per-rule defaults.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub name: String,
    pub category_defaults: BTreeMap<Category, RuleSettings>,
    pub rule_defaults: BTreeMap<RuleId, RuleSettings>,
}

/// A single conditional override: applies `settings` to files whose
/// relative path matches `path_glob`.
#[derive(Debug, Clone)]
pub struct ConditionalOverride {
    pub path_glob: String,
    pub category: Option<Category>,
    pub rule_id: Option<RuleId>,
    pub settings: RuleSettings,
}

/// User-supplied override tree, layered above the profile.
#[derive(Debug, Clone, Default)]
pub struct OverrideTree {
    pub category_overrides: BTreeMap<Category, RuleSettings>,
    pub rule_overrides: BTreeMap<RuleId, RuleSettings>,
    pub conditional_overrides: Vec<ConditionalOverride>,
}

/// Resolves effective configuration on demand; does not cache (the
/// Incremental Cache, C9, is responsible for keying by `config_digest` if
/// callers want to avoid re-resolving per file).
pub struct ConfigurationResolver<'a> {
    profile: &'a Profile,
    overrides: &'a OverrideTree,
    rule_categories: &'a BTreeMap<RuleId, Category>,
}

impl<'a> ConfigurationResolver<'a> {
    pub fn new(profile: &'a Profile, overrides: &'a OverrideTree, rule_categories: &'a BTreeMap<RuleId, Category>) -> Self {
        Self { profile, overrides, rule_categories }
    }

    /// Precedence, lowest to highest: profile category defaults
    /// -> profile per-rule defaults -> user per-category overrides -> user
    /// per-rule overrides -> user conditional overrides (matched by path).
    pub fn resolve(&self, rule_id: &str, relative_path: &Path) -> RuleSettings {
        let category = self.rule_categories.get(rule_id).cloned();
        let mut settings = RuleSettings::default();

        if let Some(category) = &category {
            if let Some(defaults) = self.profile.category_defaults.get(category) {
                settings = settings.merged_with(defaults);
            }
        }
        if let Some(defaults) = self.profile.rule_defaults.get(rule_id) {
            settings = settings.merged_with(defaults);
        }
        if let Some(category) = &category {
            if let Some(overrides) = self.overrides.category_overrides.get(category) {
                settings = settings.merged_with(overrides);
            }
        }
        if let Some(overrides) = self.overrides.rule_overrides.get(rule_id) {
            settings = settings.merged_with(overrides);
        }
        let path_str = relative_path.to_string_lossy();
        for conditional in &self.overrides.conditional_overrides {
            let matches_rule = conditional.rule_id.as_deref().map(|r| r == rule_id).unwrap_or(true);
            let matches_category = conditional
                .category
                .as_ref()
                .map(|c| category.as_deref() == Some(c.as_str()))
                .unwrap_or(true);
            if !matches_rule || !matches_category {
                continue;
            }
            if let Ok(pattern) = glob::Pattern::new(&conditional.path_glob) {
                if pattern.matches(&path_str) {
                    settings = settings.merged_with(&conditional.settings);
                }
            }
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn category_default_applies_when_nothing_overrides_it() {
        let mut profile = Profile::default();
        profile.category_defaults.insert("dead-code".into(), RuleSettings { enabled: Some(true), severity: Some(Severity::Warning), parameters: BTreeMap::new() });
        let categories = BTreeMap::from([("unused_symbol".to_string(), "dead-code".to_string())]);
        let overrides = OverrideTree::default();
        let resolver = ConfigurationResolver::new(&profile, &overrides, &categories);
        let resolved = resolver.resolve("unused_symbol", &PathBuf::from("a.swift"));
        assert_eq!(resolved.severity, Some(Severity::Warning));
    }

    #[test]
    fn rule_override_wins_over_category_default() {
        let mut profile = Profile::default();
        profile.category_defaults.insert("dead-code".into(), RuleSettings { enabled: Some(true), severity: Some(Severity::Warning), parameters: BTreeMap::new() });
        let categories = BTreeMap::from([("unused_symbol".to_string(), "dead-code".to_string())]);
        let mut overrides = OverrideTree::default();
        overrides.rule_overrides.insert("unused_symbol".into(), RuleSettings { enabled: None, severity: Some(Severity::Error), parameters: BTreeMap::new() });
        let resolver = ConfigurationResolver::new(&profile, &overrides, &categories);
        let resolved = resolver.resolve("unused_symbol", &PathBuf::from("a.swift"));
        assert_eq!(resolved.severity, Some(Severity::Error));
        assert_eq!(resolved.enabled, Some(true));
    }

    #[test]
    fn conditional_override_matched_by_path_wins_last() {
        let profile = Profile::default();
        let categories = BTreeMap::new();
        let mut overrides = OverrideTree::default();
        overrides.conditional_overrides.push(ConditionalOverride {
            path_glob: "Tests/**".into(),
            category: None,
            rule_id: Some("force_unwrap".into()),
            settings: RuleSettings { enabled: Some(false), severity: None, parameters: BTreeMap::new() },
        });
        let resolver = ConfigurationResolver::new(&profile, &overrides, &categories);
        let resolved = resolver.resolve("force_unwrap", &PathBuf::from("Tests/FooTests.swift"));
        assert_eq!(resolved.enabled, Some(false));
        let unaffected = resolver.resolve("force_unwrap", &PathBuf::from("Sources/Foo.swift"));
        assert_eq!(unaffected.enabled, None);
    }

    #[test]
    fn unknown_parameter_is_ignored_not_rejected() {
        let mut settings = RuleSettings::default();
        settings.parameters.insert("futureParam".into(), ParamValue::Bool(true));
        // Resolving never inspects unknown keys beyond storing them; rules
        // that don't ask for "futureParam" simply never see it requested.
        assert!(settings.parameters.contains_key("futureParam"));
    }
}
