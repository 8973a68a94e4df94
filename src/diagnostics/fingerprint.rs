//! Diagnostic fingerprint (spec §4.8): a stable hash used to recognize
//! "the same violation" across runs for baseline suppression.

use crate::hash::{fnv1a64_str, hex64};

/// `rule_id ":" file_relative_path ":" line ":" message`, FNV-1a64, hex.
/// Survives insertions elsewhere in the file as long as the flagged line
/// and message don't change; a line renumbering does invalidate it, which
/// spec §4.8 accepts ("stable across runs on unchanged input").
pub fn fingerprint(rule_id: &str, relative_path: &str, line: u32, message: &str) -> String {
    let input = format!("{rule_id}:{relative_path}:{line}:{message}");
    hex64(fnv1a64_str(&input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_across_calls() {
        let a = fingerprint("force_unwrap", "A.swift", 2, "boom");
        let b = fingerprint("force_unwrap", "A.swift", 2, "boom");
        assert_eq!(a, b);
    }

    #[test]
    fn differs_on_message() {
        let a = fingerprint("force_unwrap", "A.swift", 2, "boom");
        let b = fingerprint("force_unwrap", "A.swift", 2, "bang");
        assert_ne!(a, b);
    }

    #[test]
    fn is_fixed_width_hex() {
        assert_eq!(fingerprint("r", "f", 1, "m").len(), 16);
    }
}
