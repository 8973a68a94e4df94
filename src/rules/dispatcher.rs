//! Dispatcher scheduling contract.
//!
//! File-local rules run in parallel across files and, within a file, in
//! parallel across rules, bounded by `max_jobs` (grounded on this crate's
//! `rayon::prelude::par_iter` usage in `indexing/pipeline/stages/index.rs`
//! — per-item work emitting a `tracing::warn!` on failure rather than
//! aborting the batch). Cross-file rules run sequentially afterward, over
//! the now-read-only Global Graph.

use super::context::{CancellationToken, RuleContext};
use super::registry::{FileUnit, RuleMeta, RuleRegistry};
use crate::graph::GlobalReferenceGraph;
use crate::model::{Location, Severity, Violation};
use crate::resolver::RuleSettings;
use crossbeam_channel::bounded;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct Dispatcher {
    registry: RuleRegistry,
    pool: rayon::ThreadPool,
    per_file_timeout: Duration,
}

pub struct DispatchOutcome {
    pub violations: Vec<Violation>,
    /// spec §4.6: "on cancellation the dispatcher returns the violations
    /// accumulated so far, marked as partial".
    pub partial: bool,
}

impl Dispatcher {
    pub fn new(registry: RuleRegistry, max_jobs: usize, per_file_timeout: Duration) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_jobs.max(1))
            .build()
            .expect("failed to build rule dispatcher thread pool");
        Self { registry, pool, per_file_timeout }
    }

    /// Runs the file-local phase, then the cross-file phase, per spec
    /// §4.6's scheduling contract. `resolve` computes effective settings
    /// for a (rule_id, relative_path) pair (C10's `ConfigurationResolver`).
    pub fn run(
        &self,
        files: &[FileUnit<'_>],
        project_root: &Path,
        graph: &GlobalReferenceGraph,
        resolve: &(dyn Fn(&str, &Path) -> RuleSettings + Sync),
        cancellation: CancellationToken,
    ) -> DispatchOutcome {
        if cancellation.is_cancelled() {
            return DispatchOutcome { violations: Vec::new(), partial: true };
        }

        // File-local phase: parallel across files, rule-id order within a
        // file so the merge below is deterministic without a second sort.
        let mut violations = self.run_file_local_only(files, project_root, resolve, &cancellation);

        if cancellation.is_cancelled() {
            return DispatchOutcome { violations, partial: true };
        }

        // Cross-file phase: sequential, after the graph is final; rules
        // may internally parallelize their own reads.
        for rule in self.registry.cross_file_rules() {
            if cancellation.is_cancelled() {
                return DispatchOutcome { violations, partial: true };
            }
            let meta = rule.meta();
            let settings = resolve(meta.id, Path::new(""));
            let context = RuleContext { project_root, settings, graph: Some(graph), cancellation: cancellation.clone() };
            if !context.should_run() {
                continue;
            }
            violations.extend(rule.analyze_all(files, graph, &context));
        }

        DispatchOutcome { violations, partial: cancellation.is_cancelled() }
    }

    pub fn all_metas(&self) -> Vec<RuleMeta> {
        self.registry.all_metas()
    }

    pub fn find_meta(&self, rule_id: &str) -> Option<RuleMeta> {
        self.registry.find_meta(rule_id)
    }

    /// Runs only the cross-file phase over the full file set — the
    /// Incremental Cache (C9) never caches cross-file output, so this
    /// always runs against every file regardless of which ones hit cache
    /// for their symbols/references.
    pub fn run_cross_file_only(
        &self,
        files: &[FileUnit<'_>],
        project_root: &Path,
        graph: &GlobalReferenceGraph,
        resolve: &(dyn Fn(&str, &Path) -> RuleSettings + Sync),
        cancellation: &CancellationToken,
    ) -> Vec<Violation> {
        let mut violations = Vec::new();
        for rule in self.registry.cross_file_rules() {
            if cancellation.is_cancelled() {
                break;
            }
            let meta = rule.meta();
            let settings = resolve(meta.id, Path::new(""));
            let context = RuleContext { project_root, settings, graph: Some(graph), cancellation: cancellation.clone() };
            if !context.should_run() {
                continue;
            }
            violations.extend(rule.analyze_all(files, graph, &context));
        }
        violations
    }

    /// Runs only the file-local phase, over whatever subset of `files` the
    /// caller passes — the Incremental Cache (C9) uses this to dispatch
    /// just the files it couldn't serve from a cache hit, reusing cached
    /// violations for the rest instead of re-running rules against them.
    pub fn run_file_local_only(
        &self,
        files: &[FileUnit<'_>],
        project_root: &Path,
        resolve: &(dyn Fn(&str, &Path) -> RuleSettings + Sync),
        cancellation: &CancellationToken,
    ) -> Vec<Violation> {
        let per_file: Vec<Vec<Violation>> =
            self.pool.install(|| files.par_iter().map(|file| self.run_file_local(file, project_root, resolve, cancellation)).collect());
        per_file.into_iter().flatten().collect()
    }

    fn run_file_local(
        &self,
        file: &FileUnit<'_>,
        project_root: &Path,
        resolve: &(dyn Fn(&str, &Path) -> RuleSettings + Sync),
        cancellation: &CancellationToken,
    ) -> Vec<Violation> {
        let relative_path = PathBuf::from(file.relative_path);
        let per_rule: Vec<Vec<Violation>> = self
            .registry
            .file_local_rules()
            .par_iter()
            .map(|rule| {
                let meta = rule.meta();
                let settings = resolve(meta.id, &relative_path);
                let context = RuleContext { project_root, settings, graph: None, cancellation: cancellation.clone() };
                if !context.should_run() {
                    return Vec::new();
                }
                self.run_with_timeout(rule.as_ref(), file, &context, meta.id)
            })
            .collect();
        per_rule.into_iter().flatten().collect()
    }

    /// Runs a single rule against a single file with a wall-clock timeout.
    /// A rule that overruns `per_file_timeout` produces a synthetic
    /// `Rule.timeout` diagnostic instead of blocking the run indefinitely;
    /// the overrunning thread is detached (never forcibly killed — safe
    /// Rust has no mechanism for that) and left to finish on its own.
    fn run_with_timeout(
        &self,
        rule: &dyn super::registry::FileLocalRule,
        file: &FileUnit<'_>,
        context: &RuleContext<'_>,
        rule_id: &str,
    ) -> Vec<Violation> {
        let (tx, rx) = bounded(1);
        std::thread::scope(|scope| {
            scope.spawn(|| {
                let violations = rule.analyze(file, context);
                let _ = tx.send(violations);
            });
            match rx.recv_timeout(self.per_file_timeout) {
                Ok(violations) => violations,
                Err(_) => vec![timeout_violation(rule_id, file.relative_path)],
            }
        })
    }
}

fn timeout_violation(rule_id: &str, relative_path: &str) -> Violation {
    Violation::new(
        "rule.timeout",
        "dispatcher",
        Severity::Warning,
        PathBuf::from(relative_path),
        Location { line: 1, column: 1 },
        format!("rule '{rule_id}' exceeded its per-file timeout and was aborted"),
    )
}
