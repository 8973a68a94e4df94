//! Engine facade: binds C1–C10 together behind the five verbs an external
//! CLI collaborator binds to (`check`, `ci`, `baseline`, `fix`,
//! `explain`). `main.rs` is the only intended caller; this module has no
//! knowledge of argument parsing or terminal rendering.

use crate::cache::{self, Cache};
use crate::collect::collect_file;
use crate::config::EngineSettings;
use crate::diagnostics::{self, format};
use crate::error::{EngineError, EngineResult};
use crate::graph::GlobalReferenceGraph;
use crate::model::{Baseline, Confidence, EditKind, FileId, Location, Severity, StructuredEdit, Violation};
use crate::parsing::{self, Language, SyntaxTree};
use crate::resolver::{ConfigurationResolver, OverrideTree, Profile};
use crate::rules::registry::{FileUnit, RuleMeta};
use crate::rules::{CancellationToken, Dispatcher};
use crate::store::{DiscoveryPolicy, SourceStore};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
    AgentJson,
}

pub struct Engine {
    root: PathBuf,
    settings: EngineSettings,
    profile: Profile,
    overrides: OverrideTree,
    dispatcher: Dispatcher,
}

pub struct AnalysisOutput {
    pub violations: Vec<Violation>,
    pub rule_metas: Vec<RuleMeta>,
    /// Relative-path -> source text, kept around for renderers that need
    /// a source line (agent JSON `ctx`) and for `fix`'s edit application.
    pub sources: BTreeMap<PathBuf, Arc<str>>,
    pub partial: bool,
}

pub struct CheckReport {
    pub rendered: String,
    pub violations: Vec<Violation>,
    pub suppressed_by_baseline: usize,
}

pub struct CiOutcome {
    pub report: CheckReport,
    pub exit_code: i32,
}

pub struct FixReport {
    pub applied: usize,
    pub skipped_conflicts: usize,
    pub dry_run: bool,
}

/// One file's facts plus the tree and source text needed after a cache
/// miss, kept together so the cache-write pass doesn't have to re-derive
/// which file a set of facts belongs to.
struct MissedFile {
    relative_path: PathBuf,
    source: Arc<str>,
    tree: SyntaxTree,
    file_id: FileId,
    facts_for_cache: crate::collect::FileFacts,
}

/// Every successfully parsed file, cache hit or miss — cross-file rules
/// (and the cache write-back pass) need every file's tree regardless of
/// which ones skipped the Symbol/Reference Collectors. `SyntaxTree` wraps
/// `Arc<Tree>`/`Arc<str>`, so keeping a second clone alongside `MissedFile`
/// is cheap.
struct ParsedFile {
    relative_path: PathBuf,
    file_id: FileId,
    tree: SyntaxTree,
}

impl Engine {
    pub fn new(root: PathBuf, settings: EngineSettings, profile: Profile, overrides: OverrideTree) -> Self {
        let max_jobs = settings.max_jobs;
        let timeout = Duration::from_secs(settings.per_file_timeout_secs);
        let dispatcher = Dispatcher::new(crate::rules::registry::RuleRegistry::with_builtins(), max_jobs, timeout);
        Self { root, settings, profile, overrides, dispatcher }
    }

    fn config_snapshot(&self) -> String {
        // A deterministic-enough snapshot for the cache's config_digest;
        // BTreeMap iteration order gives field-stable (if not pretty)
        // output across runs of the same process.
        format!("{}|{:?}", self.profile.name, self.overrides.rule_overrides.keys().collect::<Vec<_>>())
    }

    fn rule_categories(&self) -> BTreeMap<String, String> {
        self.dispatcher.all_metas().into_iter().map(|m| (m.id.to_string(), m.category.to_string())).collect()
    }

    fn resolver_fn(&self) -> impl Fn(&str, &Path) -> crate::resolver::RuleSettings + '_ {
        let categories = self.rule_categories();
        move |rule_id: &str, path: &Path| {
            let resolver = ConfigurationResolver::new(&self.profile, &self.overrides, &categories);
            resolver.resolve(rule_id, path)
        }
    }

    /// Runs C1–C7 over every file under `root` and returns the merged,
    /// not-yet-pipelined violation set (§4.8 runs separately, so `fix`
    /// can apply edits without severity/baseline processing getting in
    /// the way).
    ///
    /// Incremental caching (C9): a file whose `(tool_version,
    /// file_content_digest, rule_set_digest, config_digest)` key hits the
    /// cache skips the Symbol/Reference Collectors entirely and reuses
    /// its cached violations. Parsing itself still happens on every run —
    /// cross-file rules need every file's tree to compute byte-accurate
    /// locations for violations anywhere in the graph, including in
    /// cached files — but spec §8 S6's invariant is scoped to "symbol and
    /// reference collection", which this does skip on a hit. Cross-file
    /// rules therefore dispatch over *every* parsed file (`parsed` below),
    /// not just the ones that missed the cache, so a hit is indistinguishable
    /// from a fresh analysis (spec §4.9, P6).
    pub fn analyze(&self) -> EngineResult<AnalysisOutput> {
        let discovery = DiscoveryPolicy::new(&self.settings.include, &self.settings.exclude);
        let mut store = SourceStore::new(self.settings.strict_io);
        let file_ids = store.load(&self.root, &discovery)?;

        let metas = self.dispatcher.all_metas();
        let rule_set_digest = cache::rule_set_digest(&metas.iter().map(|m| m.id).collect::<Vec<_>>());
        let config_digest = cache::config_digest(&self.config_snapshot());
        let cache_store = Cache::new(self.settings.cache_dir.clone());

        let mut all_facts = Vec::new();
        let mut violations = Vec::new();
        let mut missed = Vec::new();
        let mut parsed = Vec::new();
        let mut sources = BTreeMap::new();

        for id in file_ids {
            let record = store.record(id).expect("just-loaded file id must have a record");
            sources.insert(record.relative_path.clone(), record.source.clone());
            let key = cache::key_digest(TOOL_VERSION, cache::file_content_digest(&record.source), rule_set_digest, config_digest);

            let relative_path = record.relative_path.to_string_lossy().into_owned();
            let tree = match parsing::parse(Language::Swift, record.source.clone()) {
                Ok(tree) => tree,
                Err(err) => {
                    warn!(file = %relative_path, error = %err, "parse error, proceeding with partial analysis");
                    violations.push(parse_error_violation(&relative_path));
                    continue;
                }
            };
            let relative_path = PathBuf::from(relative_path);
            parsed.push(ParsedFile { relative_path: relative_path.clone(), file_id: id, tree: tree.clone() });

            if let Some((facts, cached)) = cache_store.get(key) {
                all_facts.push(facts);
                violations.extend(cached);
                continue;
            }

            let module: Arc<str> = record.module_name.clone().unwrap_or_else(|| "App".to_string()).into();
            let relative_path_str = relative_path.to_string_lossy().into_owned();
            let facts = collect_file(&tree, module, &relative_path_str, id);
            all_facts.push(facts.clone());
            missed.push(MissedFile { relative_path, source: record.source.clone(), tree, file_id: id, facts_for_cache: facts });
        }

        let graph = GlobalReferenceGraph::build(all_facts);

        let missed_units: Vec<FileUnit<'_>> =
            missed.iter().map(|m| FileUnit { file_id: m.file_id, relative_path: m.relative_path.to_str().unwrap_or_default(), tree: &m.tree }).collect();
        let all_units: Vec<FileUnit<'_>> =
            parsed.iter().map(|p| FileUnit { file_id: p.file_id, relative_path: p.relative_path.to_str().unwrap_or_default(), tree: &p.tree }).collect();

        let resolve = self.resolver_fn();
        let cancellation = CancellationToken::new();

        let file_local_violations = self.dispatcher.run_file_local_only(&missed_units, &self.root, &resolve, &cancellation);

        for missed_file in &missed {
            let key = cache::key_digest(TOOL_VERSION, cache::file_content_digest(&missed_file.source), rule_set_digest, config_digest);
            let this_file_violations: Vec<Violation> = file_local_violations.iter().filter(|v| v.file == missed_file.relative_path).cloned().collect();
            if let Err(err) = cache_store.put(key, &missed_file.facts_for_cache, &this_file_violations) {
                warn!(file = %missed_file.relative_path.display(), error = %err, "failed to write cache entry");
            }
        }

        let cross_file_violations = self.dispatcher.run_cross_file_only(&all_units, &self.root, &graph, &resolve, &cancellation);

        violations.extend(file_local_violations);
        violations.extend(cross_file_violations);

        Ok(AnalysisOutput { violations, rule_metas: metas, sources, partial: cancellation.is_cancelled() })
    }

    /// spec §6 `check(root, config, format, min_severity)`.
    pub fn check(&self, format_choice: OutputFormat, min_severity: Severity, baseline: Option<&Baseline>, now_iso8601: &str) -> EngineResult<CheckReport> {
        let analysis = self.analyze()?;
        let resolve = self.resolver_fn();
        let outcome = diagnostics::process(analysis.violations, &analysis.rule_metas, &resolve, baseline, min_severity, now_iso8601);

        let rendered = match format_choice {
            OutputFormat::Human => format::render_human(&outcome.violations),
            OutputFormat::Json => format::render_json(&outcome.violations).map_err(|e| EngineError::General(e.to_string()))?,
            OutputFormat::AgentJson => {
                format::render_agent_json(&outcome.violations, |v| source_line(&analysis.sources, v)).map_err(|e| EngineError::General(e.to_string()))?
            }
        };

        Ok(CheckReport { rendered, violations: outcome.violations, suppressed_by_baseline: outcome.suppressed_by_baseline })
    }

    /// spec §6 `ci(root, config, baseline, fail_on)`: like `check`, plus an
    /// exit code derived from whether any violation meets `fail_on`.
    pub fn ci(&self, baseline: Option<&Baseline>, fail_on: Severity, format_choice: OutputFormat, now_iso8601: &str) -> EngineResult<CiOutcome> {
        let report = self.check(format_choice, Severity::Hint, baseline, now_iso8601)?;
        let exit_code = if report.violations.iter().any(|v| v.severity >= fail_on) { 1 } else { 0 };
        Ok(CiOutcome { report, exit_code })
    }

    /// spec §6 `baseline(root, config, out_path)`.
    pub fn baseline(&self, out_path: &Path, now_iso8601: &str, expires_iso8601: Option<String>) -> EngineResult<Baseline> {
        let analysis = self.analyze()?;
        let resolve = self.resolver_fn();
        let outcome = diagnostics::process(analysis.violations, &analysis.rule_metas, &resolve, None, Severity::Hint, now_iso8601);
        let baseline = diagnostics::build_baseline(&outcome.violations, now_iso8601.to_string(), expires_iso8601);
        let json = serde_json::to_string_pretty(&baseline).map_err(|e| EngineError::General(e.to_string()))?;
        std::fs::write(out_path, json).map_err(|source| EngineError::FilesystemWrite { path: out_path.to_path_buf(), source })?;
        Ok(baseline)
    }

    /// spec §6 `fix(root, config, confidence, dry_run)` plus §7's auto-fix
    /// policy: edits in the same file apply in reverse byte-range order;
    /// overlapping edits from different rules are rejected wholesale for
    /// that file rather than partially applied.
    pub fn fix(&self, min_confidence: Confidence, dry_run: bool) -> EngineResult<FixReport> {
        let analysis = self.analyze()?;
        let mut applied = 0usize;
        let mut skipped_conflicts = 0usize;

        let mut edits_by_file: BTreeMap<PathBuf, Vec<StructuredEdit>> = BTreeMap::new();
        for violation in &analysis.violations {
            for edit in &violation.structured_edits {
                if edit.confidence >= min_confidence {
                    edits_by_file.entry(violation.file.clone()).or_default().push(edit.clone());
                }
            }
        }

        for (relative_path, mut edits) in edits_by_file {
            if has_overlap(&edits) {
                skipped_conflicts += edits.len();
                continue;
            }
            edits.sort_by(|a, b| b.range.start.cmp(&a.range.start));

            let Some(source) = analysis.sources.get(&relative_path) else { continue };
            let mut text = source.to_string();
            for edit in &edits {
                let start = edit.range.start as usize;
                let end = edit.range.end as usize;
                if start > text.len() || end > text.len() || start > end {
                    continue;
                }
                let replacement = match edit.kind {
                    EditKind::Remove => "",
                    _ => edit.replacement.as_ref(),
                };
                text.replace_range(start..end, replacement);
                applied += 1;
            }

            if !dry_run {
                let absolute = self.root.join(&relative_path);
                std::fs::write(&absolute, text).map_err(|source| EngineError::FilesystemWrite { path: absolute, source })?;
            }
        }

        Ok(FixReport { applied, skipped_conflicts, dry_run })
    }

    /// spec §6 `explain(rule_id)`.
    pub fn explain(&self, rule_id: &str) -> Option<RuleMeta> {
        self.dispatcher.find_meta(rule_id)
    }
}

fn parse_error_violation(relative_path: &str) -> Violation {
    Violation::new(
        "parse.error",
        "engine",
        Severity::Warning,
        PathBuf::from(relative_path),
        Location { line: 1, column: 1 },
        "file could not be parsed; analysis proceeded without it",
    )
}

fn has_overlap(edits: &[StructuredEdit]) -> bool {
    let mut sorted: Vec<&StructuredEdit> = edits.iter().collect();
    sorted.sort_by_key(|e| e.range.start);
    sorted.windows(2).any(|w| w[0].range.end > w[1].range.start)
}

fn source_line(sources: &BTreeMap<PathBuf, Arc<str>>, violation: &Violation) -> Option<String> {
    let source = sources.get(&violation.file)?;
    source.lines().nth(violation.location.line.saturating_sub(1) as usize).map(str::to_string)
}
