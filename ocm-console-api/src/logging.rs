//! Logging configuration
//!
//! Console output plus an optional rolling JSON file.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_NAME: &str = "ocm-console-api.log";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (trace, debug, info, warn, error)
    pub level: String,
    /// Directory for rolling log files; console only when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    pub rotation: LogRotation,
    /// JSON lines on the console instead of the human format
    pub json_format: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Hourly,
    Daily,
    Never,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            rotation: LogRotation::Daily,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }

    /// Install the global subscriber. Keep the returned guard alive for as
    /// long as file logging should be flushed.
    pub fn init(&self) -> anyhow::Result<Option<WorkerGuard>> {
        let console_layer = if self.json_format {
            fmt::layer()
                .json()
                .with_target(true)
                .with_writer(io::stdout)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_ansi(true)
                .with_writer(io::stdout)
                .boxed()
        };

        let (file_layer, guard) = match &self.log_dir {
            Some(dir) => {
                let appender = match self.rotation {
                    LogRotation::Hourly => rolling::hourly(dir, LOG_FILE_NAME),
                    LogRotation::Daily => rolling::daily(dir, LOG_FILE_NAME),
                    LogRotation::Never => rolling::never(dir, LOG_FILE_NAME),
                };
                let (writer, guard) = non_blocking(appender);
                let layer = fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_ansi(false)
                    .json()
                    .with_writer(writer)
                    .boxed();
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(self.env_filter())
            .with(console_layer)
            .with(file_layer)
            .try_init()?;

        tracing::info!(level = %self.level, file = ?self.log_dir, "Logging initialized");

        Ok(guard)
    }
}
