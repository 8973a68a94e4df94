//! Error taxonomy.
//!
//! Each variant maps to one of six distinguished error classes and carries
//! the propagation policy in its doc comment so call sites don't have to
//! re-derive it. Structured the way this crate's lineage structures
//! `IndexError`/`ParseError`: a flat `thiserror` enum plus a small
//! `ErrorContext` extension trait for attaching context without manual
//! `map_err` boilerplate.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Filesystem errors: logged, file skipped, unless `strict_io`.
    #[error("failed to read '{path}': {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    FilesystemWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parse errors never abort a run; the file is processed with error
    /// nodes and a synthetic `parse.error` diagnostic is emitted instead.
    /// This variant exists for callers (e.g. the cache) that need to
    /// represent the condition as a `Result`.
    #[error("parse error in '{path}' at byte {byte_offset}: {reason}")]
    Parse {
        path: PathBuf,
        byte_offset: u32,
        reason: String,
    },

    /// Configuration errors are fatal to the run (exit code 2).
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// Baseline errors are never fatal: treated as "no baseline" plus a
    /// warning.
    #[error("baseline error: {reason}")]
    Baseline { reason: String },

    /// Caught at the rule-dispatch boundary and converted into a synthetic
    /// `rule.internal_error` diagnostic; the run continues.
    #[error("rule '{rule_id}' failed: {reason}")]
    RuleRuntime { rule_id: String, reason: String },

    #[error("analysis cancelled")]
    Cancelled,

    #[error("rule '{rule_id}' timed out after {elapsed_ms}ms analyzing '{path}'")]
    Timeout {
        rule_id: String,
        path: PathBuf,
        elapsed_ms: u64,
    },

    #[error("{0}")]
    General(String),
}

impl EngineError {
    /// Process exit code per spec §6, for the classes that determine one
    /// directly (most classes are recovered from internally and never reach
    /// the process boundary as an `EngineError`).
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Filesystem { .. } | Self::FilesystemWrite { .. } => 3,
            _ => 4,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

pub trait ErrorContext<T> {
    fn context(self, msg: &str) -> Result<T, EngineError>;
    fn with_path(self, path: &std::path::Path) -> Result<T, EngineError>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: &str) -> Result<T, EngineError> {
        self.map_err(|e| EngineError::General(format!("{msg}: {e}")))
    }

    fn with_path(self, path: &std::path::Path) -> Result<T, EngineError> {
        self.map_err(|e| EngineError::General(format!("error processing '{}': {e}", path.display())))
    }
}
