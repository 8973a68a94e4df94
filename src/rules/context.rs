//! Per-rule-invocation context (spec §4.6: "context exposes: effective
//! configuration, project root, the Global Graph (post-build) for
//! cross-file rules, and a policy helper").

use crate::graph::GlobalReferenceGraph;
use crate::resolver::RuleSettings;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cooperative-cancellation flag (spec §5): rule code checks this at
/// coarse points rather than being preempted.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct RuleContext<'a> {
    pub project_root: &'a Path,
    pub settings: RuleSettings,
    /// `None` for file-local rule invocations; populated for cross-file
    /// rules, which run after the Global Graph is fully built (spec §4.6).
    pub graph: Option<&'a GlobalReferenceGraph>,
    pub cancellation: CancellationToken,
}

impl<'a> RuleContext<'a> {
    /// spec §4.6 "a policy helper that says whether this rule should run
    /// for a given file" — governed by the resolved `enabled` flag; file
    /// include/exclude glob matching happens earlier, in the Source Store.
    pub fn should_run(&self) -> bool {
        self.settings.enabled.unwrap_or(true)
    }

    pub fn relative_path(&self, absolute: &Path) -> PathBuf {
        absolute.strip_prefix(self.project_root).map(Path::to_path_buf).unwrap_or_else(|_| absolute.to_path_buf())
    }
}
