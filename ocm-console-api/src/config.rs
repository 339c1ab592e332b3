//! Configuration management for the OCM console API
//!
//! Settings are loaded from:
//! 1. Environment variables (highest priority)
//! 2. Configuration file (TOML format)
//! 3. Default values (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::import::RetryPolicy;
pub use crate::logging::{LogRotation, LoggingConfig};

/// Main configuration struct for the console API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// HTTP listener
    pub server: ServerConfig,
    /// Hub cluster connection
    pub kubernetes: KubernetesConfig,
    /// Import secret polling and command rendering
    pub import: ImportConfig,
    /// Bare metal asset listing cache
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Grace period for in-flight requests on shutdown
    pub shutdown_timeout_secs: u64,
}

/// Hub cluster connection. Without a kubeconfig path the client is inferred
/// from `KUBECONFIG`, `~/.kube/config` or the in-cluster service account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Import secret lookups before giving up
    pub max_attempts: u32,
    /// Wait between lookups
    pub retry_delay_ms: u64,
    /// Printed by the import command when the manifests cannot be applied
    pub already_imported_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a bare metal asset listing stays fresh
    pub ttl_secs: u64,
    /// Background refresh interval; 0 disables polling
    pub poll_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            shutdown_timeout_secs: 30,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            retry_delay_ms: 500,
            already_imported_message: crate::import::DEFAULT_ALREADY_IMPORTED_MESSAGE.to_string(),
        }
    }
}

impl ImportConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 5 * 60,
            poll_interval_secs: 30,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_secs > 0).then(|| Duration::from_secs(self.poll_interval_secs))
    }
}

impl ConsoleConfig {
    /// Load configuration from environment variables and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            std::env::var("OCM_CONSOLE_CONFIG").ok().map(PathBuf::from),
            Some(PathBuf::from("/etc/ocm-console/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        paths.into_iter().flatten().find(|p| p.exists())
    }

    /// Apply `OCM_CONSOLE_*` overrides; `lookup` is `std::env::var` outside tests
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(host) = lookup("OCM_CONSOLE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("OCM_CONSOLE_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }

        // Kubernetes
        if let Some(path) = lookup("OCM_CONSOLE_KUBECONFIG") {
            self.kubernetes.kubeconfig = Some(PathBuf::from(path));
        }
        if let Some(context) = lookup("OCM_CONSOLE_KUBE_CONTEXT") {
            self.kubernetes.context = Some(context);
        }

        // Import
        if let Some(n) = lookup("OCM_CONSOLE_IMPORT_MAX_ATTEMPTS").and_then(|v| v.parse().ok()) {
            self.import.max_attempts = n;
        }
        if let Some(ms) = lookup("OCM_CONSOLE_IMPORT_RETRY_DELAY_MS").and_then(|v| v.parse().ok()) {
            self.import.retry_delay_ms = ms;
        }
        if let Some(message) = lookup("OCM_CONSOLE_ALREADY_IMPORTED_MESSAGE") {
            self.import.already_imported_message = message;
        }

        // Cache
        if let Some(ttl) = lookup("OCM_CONSOLE_CACHE_TTL_SECS").and_then(|v| v.parse().ok()) {
            self.cache.ttl_secs = ttl;
        }
        if let Some(secs) = lookup("OCM_CONSOLE_POLL_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            self.cache.poll_interval_secs = secs;
        }

        // Logging
        if let Some(level) = lookup("OCM_CONSOLE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(dir) = lookup("OCM_CONSOLE_LOG_DIR") {
            self.logging.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(json) = lookup("OCM_CONSOLE_LOG_JSON") {
            self.logging.json_format = json.parse().unwrap_or(false);
        }
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("Port cannot be 0".to_string()));
        }

        if self.import.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "import.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::Validation(
                "cache.ttl_secs must be greater than 0".to_string(),
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Validation("Log level cannot be empty".to_string()));
        }

        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Failed to read configuration file
    FileRead(PathBuf, String),
    /// Failed to parse configuration
    Parse(String),
    /// Configuration validation failed
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, err) => {
                write!(f, "Failed to read config file {:?}: {}", path, err)
            }
            ConfigError::Parse(err) => write!(f, "Failed to parse config: {}", err),
            ConfigError::Validation(err) => write!(f, "Config validation failed: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}
