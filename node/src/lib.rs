use serde::{Deserialize, Serialize};
use std::{path::PathBuf, str::FromStr, time::Duration};
use thiserror::Error;
use tracing::Level;

pub mod ledger;

/// Configuration for the ledger node.
#[derive(Deserialize, Serialize)]
pub struct Config {
    pub store_path: String,

    pub metrics_port: u16,
    pub worker_threads: usize,
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,

    pub mailbox_size: usize,
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
    #[error("store_path must not be empty")]
    MissingStorePath,
}

pub struct ValidatedConfig {
    pub store_path: PathBuf,

    pub metrics_port: u16,
    pub worker_threads: usize,
    pub log_level: Level,
    pub log_json: bool,

    pub mailbox_size: usize,
    pub session_timeout: Duration,
    pub sweep_interval: Duration,
}

fn default_session_timeout_ms() -> u64 {
    5 * 60 * 1_000
}

fn default_sweep_interval_ms() -> u64 {
    30 * 1_000
}

fn non_zero(field: &'static str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidNonZero { field, value });
    }
    Ok(value)
}

impl Config {
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        if self.store_path.trim().is_empty() {
            return Err(ConfigError::MissingStorePath);
        }
        non_zero("worker_threads", self.worker_threads as u64)?;
        non_zero("mailbox_size", self.mailbox_size as u64)?;
        let session_timeout_ms = non_zero("session_timeout_ms", self.session_timeout_ms)?;
        let sweep_interval_ms = non_zero("sweep_interval_ms", self.sweep_interval_ms)?;

        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        Ok(ValidatedConfig {
            store_path: PathBuf::from(self.store_path),
            metrics_port: self.metrics_port,
            worker_threads: self.worker_threads,
            log_level,
            log_json: self.log_json,
            mailbox_size: self.mailbox_size,
            session_timeout: Duration::from_millis(session_timeout_ms),
            sweep_interval: Duration::from_millis(sweep_interval_ms),
        })
    }
}

impl ValidatedConfig {
    pub fn ledger(&self) -> ledger::Config {
        ledger::Config {
            store_path: self.store_path.clone(),
            mailbox_size: self.mailbox_size,
            session_timeout: self.session_timeout,
            sweep_interval: self.sweep_interval,
        }
    }
}

#[cfg(test)]
mod tests;
