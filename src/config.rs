//! Engine bootstrap configuration.
//!
//! Distinct from the Configuration Resolver (C10, `resolver/`): this is the
//! engine's *own* small settings object (cache location, worker count,
//! logging, default discovery globs), loaded the way this crate's lineage
//! already loads `Settings` — a layered `figment::Figment` stack of
//! defaults, a TOML file, then environment variables.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub default: String,
    #[serde(default)]
    pub modules: std::collections::BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: Default::default(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineSettings {
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,
    #[serde(default = "default_timeout_secs")]
    pub per_file_timeout_secs: u64,
    #[serde(default)]
    pub strict_io: bool,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".staticlens/cache")
}

fn default_max_jobs() -> usize {
    num_cpus::get()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_include() -> Vec<String> {
    Vec::new()
}

fn default_exclude() -> Vec<String> {
    vec![
        "**/.build/**".to_string(),
        "**/DerivedData/**".to_string(),
        "**/.git/**".to_string(),
    ]
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            max_jobs: default_max_jobs(),
            per_file_timeout_secs: default_timeout_secs(),
            strict_io: false,
            logging: LoggingConfig::default(),
            include: default_include(),
            exclude: default_exclude(),
        }
    }
}

impl EngineSettings {
    /// Layered load: defaults → `.staticlens/settings.toml` (if present) →
    /// `ANALYZER_` prefixed environment variables with `__` nested-key
    /// translation, mirroring this crate's existing `Settings::load`.
    pub fn load() -> Result<Self, figment::Error> {
        let config_path = PathBuf::from(".staticlens/settings.toml");
        Self::load_from(config_path)
    }

    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(EngineSettings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("ANALYZER_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_sane() {
        let settings = EngineSettings::default();
        assert!(settings.max_jobs > 0);
        assert_eq!(settings.per_file_timeout_secs, 60);
    }

    #[test]
    fn toml_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "max_jobs = 3\nstrict_io = true\n").unwrap();
        let settings = EngineSettings::load_from(&path).unwrap();
        assert_eq!(settings.max_jobs, 3);
        assert!(settings.strict_io);
        // untouched fields keep their defaults
        assert_eq!(settings.per_file_timeout_secs, 60);
    }

    #[test]
    fn env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "max_jobs = 3\n").unwrap();
        unsafe {
            std::env::set_var("ANALYZER_MAX_JOBS", "9");
        }
        let settings = EngineSettings::load_from(&path).unwrap();
        assert_eq!(settings.max_jobs, 9);
        unsafe {
            std::env::remove_var("ANALYZER_MAX_JOBS");
        }
    }
}
