//! Run configuration for contract testing

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: f64 = 20.0;

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL every fixture route is appended to
    #[serde(alias = "baseHostUrl")]
    pub base_url: String,

    /// Fixture documents, run in this order
    #[serde(default, alias = "fixtureFiles")]
    pub fixtures: Vec<PathBuf>,

    /// Headers sent with every request (fixture headers win on conflict)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Keep request/response snapshots for passing scenarios too
    #[serde(default, alias = "includeBodiesOnSuccess")]
    pub include_bodies_on_success: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout", alias = "requestTimeout")]
    pub request_timeout: f64,

    /// How strictly a populated `errors` field is judged
    #[serde(default)]
    pub strictness: Strictness,

    /// Test cases evaluated concurrently (1 = sequential)
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Treatment of a non-empty `errors` field in responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Any populated `errors` field fails the scenario
    #[default]
    Strict,
    /// Sad paths with an expected error body are judged by deep equality only
    Lenient,
}

const fn default_request_timeout() -> f64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

const fn default_workers() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            fixtures: Vec::new(),
            headers: BTreeMap::new(),
            include_bodies_on_success: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
            strictness: Strictness::Strict,
            workers: 1,
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from default location (.apicontract.toml)
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = [".apicontract.toml", ".apicontract.json", "apicontract.toml"];

        for name in candidates {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    /// Request timeout as a `Duration`.
    ///
    /// Non-positive or non-finite values fall back to the default.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        if self.request_timeout.is_finite() && self.request_timeout > 0.0 {
            Duration::from_secs_f64(self.request_timeout)
        } else {
            Duration::from_secs_f64(DEFAULT_REQUEST_TIMEOUT_SECS)
        }
    }

    /// Worker count, never below one.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }

    /// Create example config file
    pub fn example() -> &'static str {
        r#"# apicontract configuration

# API host every fixture route is appended to
base_url = "http://localhost:8080"

# Fixture documents (JSON or YAML), run in this order
fixtures = ["fixtures/test_data.json"]

# Headers sent with every request; fixture headers win on conflict
[headers]
# Authorization = "Bearer your-token-here"

# Keep request/response bodies in the report for passing scenarios too
# include_bodies_on_success = false

# Per-request timeout in seconds
# request_timeout = 20.0

# "strict": any populated `errors` field fails a scenario
# "lenient": sad paths with an expected error body are judged by equality only
# strictness = "strict"

# Test cases run concurrently (scenarios of one case always run in order)
# workers = 1
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}
