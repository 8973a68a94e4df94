//! Rule Registry & Dispatcher (C6, spec §4.6).

pub mod builtin;
pub mod context;
pub mod dispatcher;
pub mod registry;

pub use context::{CancellationToken, RuleContext};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use registry::{CrossFileRule, FileLocalRule, RuleMeta, RuleRegistry};
