//! # Node Configuration
//!
//! One JSON document (path in `BM_CONFIG`, optional) holding every
//! subsystem's settings, then `BM_*` environment overrides on top.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `BM_LOG_LEVEL` | `logging.level` |
//! | `BM_LOG_JSON` | `logging.json` |
//! | `BM_POW_ENABLED` | `pow.enabled` |
//! | `BM_POW_THREADS` | `pow.threads` |
//! | `BM_REQUEST_ACKS` | `pipeline.objects.request_acks` |
//! | `BM_PASS_INTERVAL_SECS` | `queue.pass_interval_secs` |
//! | `BM_RELAYS` | `relays` (comma-separated URLs) |

use bm_02_pow::PowConfig;
use bm_04_pipeline::PipelineConfig;
use bm_05_queue::QueueConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Environment variable naming the JSON config file.
pub const CONFIG_PATH_VAR: &str = "BM_CONFIG";

/// Complete node configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Logging output.
    pub logging: LoggingConfig,
    /// Proof of work.
    pub pow: PowConfig,
    /// Message pipeline.
    pub pipeline: PipelineConfig,
    /// Task queue.
    pub queue: QueueConfig,
    /// Relay servers.
    pub relays: Vec<RelayConfig>,
    /// Label for the identity created on first start.
    pub identity_label: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// A relay endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelayConfig {
    /// Base URL.
    pub url: String,
    /// Basic-auth user.
    #[serde(default)]
    pub username: String,
    /// Basic-auth password.
    #[serde(default)]
    pub password: String,
}

impl RelayConfig {
    /// Relay without credentials.
    pub fn anonymous(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Cannot read config file {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// I/O failure
        source: std::io::Error,
    },

    /// Config file is not valid JSON for `NodeConfig`.
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    /// An override variable has an unusable value.
    #[error("Invalid value {value:?} for {name}")]
    InvalidVariable {
        /// Variable name
        name: &'static str,
        /// Offending value
        value: String,
    },
}

impl NodeConfig {
    /// Parse a JSON document; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// File named by `BM_CONFIG` (or defaults), then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let lookup = |name: &str| std::env::var(name).ok();
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Apply `BM_*` overrides using `lookup` to read variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("BM_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = parse_var(&lookup, "BM_LOG_JSON")? {
            self.logging.json = json;
        }
        if let Some(enabled) = parse_var(&lookup, "BM_POW_ENABLED")? {
            self.pow.enabled = enabled;
        }
        if let Some(threads) = parse_var(&lookup, "BM_POW_THREADS")? {
            self.pow.threads = threads;
        }
        if let Some(acks) = parse_var(&lookup, "BM_REQUEST_ACKS")? {
            self.pipeline.objects.request_acks = acks;
        }
        if let Some(interval) = parse_var(&lookup, "BM_PASS_INTERVAL_SECS")? {
            self.queue.pass_interval_secs = interval;
        }
        if let Some(relays) = lookup("BM_RELAYS") {
            self.relays = relays
                .split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(RelayConfig::anonymous)
                .collect();
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVariable { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.queue.max_attempts, 500);
        assert!(config.pipeline.objects.request_acks);
        assert!(config.relays.is_empty());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = NodeConfig::from_json(
            r#"{
                "pow": { "enabled": false },
                "queue": { "max_attempts": 3 },
                "relays": [{ "url": "https://relay.example" }]
            }"#,
        )
        .unwrap();
        assert!(!config.pow.enabled);
        assert_eq!(config.queue.max_attempts, 3);
        assert_eq!(config.queue.pass_interval_secs, 60);
        assert_eq!(config.relays, vec![RelayConfig::anonymous("https://relay.example")]);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = NodeConfig::default();
        config
            .apply_overrides(env(&[
                ("BM_LOG_LEVEL", "debug"),
                ("BM_LOG_JSON", "true"),
                ("BM_POW_THREADS", "3"),
                ("BM_RELAYS", "https://a, https://b,"),
            ]))
            .unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(config.pow.threads, 3);
        assert_eq!(config.relays.len(), 2);
        assert_eq!(config.relays[1].url, "https://b");
    }

    #[test]
    fn test_bad_override_is_reported() {
        let mut config = NodeConfig::default();
        let err = config
            .apply_overrides(env(&[("BM_POW_ENABLED", "sometimes")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidVariable {
                name: "BM_POW_ENABLED",
                ..
            }
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "identity_label": "desk" }}"#).unwrap();
        let config = NodeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.identity_label.as_deref(), Some("desk"));

        assert!(matches!(
            NodeConfig::from_file(Path::new("/nonexistent/bm.json")),
            Err(ConfigError::Read { .. })
        ));
    }
}
