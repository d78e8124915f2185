//! Configuration management for talentsift.
//!
//! Supports three-layer configuration loading:
//! 1. Built-in defaults
//! 2. TOML config file (`~/.talentsift/config.toml`)
//! 3. Environment variable overrides (`TALENTSIFT_` prefix)
//!
//! CLI flag overrides are applied by the binary crate after loading.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_db_path() -> String {
    "~/.talentsift/talentsift.db".to_string()
}

fn default_storage_backend() -> String {
    "local".to_string()
}

fn default_storage_dir() -> String {
    "~/.talentsift/blobs".to_string()
}

fn default_poll_interval() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_batch_size() -> u32 {
    10
}

fn default_stuck_threshold() -> u64 {
    600
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

/// Top-level configuration for the screening worker.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Database location.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Blob storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Polling worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,

    /// LLM and embedding provider settings.
    #[serde(default)]
    pub llm: LlmConfig,
}

/// Database location settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file. `~` is expanded.
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Blob storage backend selection and backend-specific settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Backend selector. Only `"local"` is currently supported.
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Base directory for the local backend. `~` is expanded.
    #[serde(default = "default_storage_dir")]
    pub base_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            base_dir: default_storage_dir(),
        }
    }
}

/// Polling worker settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    /// Seconds to sleep when the queue is empty.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Attempts after which a failed queue item projects the candidate
    /// into the ERROR state.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Maximum texts per embedding request.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Seconds after which a RUNNING queue item with no progress is
    /// considered orphaned and reset to READY.
    #[serde(default = "default_stuck_threshold")]
    pub stuck_threshold_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            max_retries: default_max_retries(),
            batch_size: default_batch_size(),
            stuck_threshold_secs: default_stuck_threshold(),
        }
    }
}

impl WorkerConfig {
    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Stuck-item threshold as a [`Duration`].
    pub fn stuck_threshold(&self) -> Duration {
        Duration::from_secs(self.stuck_threshold_secs)
    }
}

/// LLM and embedding provider settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible endpoint.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// API key. Empty means not configured.
    #[serde(default)]
    pub api_key: String,

    /// Chat model used for extraction and explanation.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Embedding model.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Optional embedding dimensionality, forwarded to the provider.
    #[serde(default)]
    pub embedding_dimensions: Option<u32>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: String::new(),
            model: default_llm_model(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl LlmConfig {
    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Load configuration from an optional TOML file, then apply
    /// environment variable overrides.
    ///
    /// A missing file is not an error: defaults apply. A present but
    /// unreadable file is.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => {
                let expanded = expand_tilde(p);
                if Path::new(&expanded).exists() {
                    let raw = std::fs::read_to_string(&expanded).map_err(|_| {
                        ConfigError::FileNotFound {
                            path: expanded.clone(),
                        }
                    })?;
                    toml::from_str(&raw).map_err(|e| ConfigError::ParseError { source: e })?
                } else {
                    Self::default()
                }
            }
            None => Self::default(),
        };

        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `TALENTSIFT_`-prefixed overrides using the given variable lookup.
    ///
    /// Taking the lookup as a closure keeps this testable without mutating
    /// process-wide environment state.
    fn apply_env_overrides<F>(&mut self, get: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = get("TALENTSIFT_DATABASE_PATH") {
            self.database.path = v;
        }
        if let Some(v) = get("TALENTSIFT_STORAGE_DIR") {
            self.storage.base_dir = v;
        }
        if let Some(v) = get("TALENTSIFT_STORAGE_BACKEND") {
            self.storage.backend = v;
        }
        if let Some(v) = get("TALENTSIFT_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = get("TALENTSIFT_LLM_API_KEY") {
            self.llm.api_key = v;
        }
        if let Some(v) = get("TALENTSIFT_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = get("TALENTSIFT_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Some(v) = get("TALENTSIFT_POLL_INTERVAL_SECS") {
            self.worker.poll_interval_secs =
                parse_env_number("worker.poll_interval_secs", &v)?;
        }
        if let Some(v) = get("TALENTSIFT_MAX_RETRIES") {
            self.worker.max_retries = parse_env_number("worker.max_retries", &v)?;
        }
        if let Some(v) = get("TALENTSIFT_BATCH_SIZE") {
            self.worker.batch_size = parse_env_number("worker.batch_size", &v)?;
        }
        Ok(())
    }

    /// Validate cross-field constraints.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend != "local" {
            return Err(ConfigError::InvalidValue {
                field: "storage.backend".to_string(),
                message: format!("unsupported backend '{}'", self.storage.backend),
            });
        }
        if self.worker.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "worker.poll_interval_secs".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }
        if self.worker.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "worker.batch_size".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_env_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        message: format!("'{value}' is not a valid number"),
    })
}

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home.to_string_lossy().to_string();
        }
    }
    path.to_string()
}
