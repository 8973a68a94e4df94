//! Concrete rule bodies shipped with the engine.
//!
//! Individual rule *bodies* are out of scope in general, but two scenarios
//! pin exact expected diagnostics for two rules, which makes them
//! executable specifications rather than examples. The Dead-Code Analyzer
//! is the worked cross-file rule example walked through end to end. These
//! three are kept deliberately minimal; they are not meant to be a rule
//! library.

pub mod dead_code;
pub mod force_unwrap;
pub mod reference_cycle;
