use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use jobrelay_core::SettleBudget;
use jobrelay_engine::{FetchSettings, OrchestratorSettings, RelayConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "jobrelay.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// On-disk settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: String,
    pub relay_timeout_ms: Option<u64>,
    pub load_settle_ms: u64,
    pub injection_settle_ms: u64,
    pub serialize_runs: bool,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub fetch_timeout_ms: u64,
    pub fetch_max_bytes: u64,
    pub log_file: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let relay = RelayConfig::default();
        let budget = SettleBudget::default();
        let retry = RetryPolicy::default();
        let fetch = FetchSettings::default();
        Self {
            endpoint: relay.endpoint,
            relay_timeout_ms: relay.timeout.map(duration_ms),
            load_settle_ms: duration_ms(budget.after_load),
            injection_settle_ms: duration_ms(budget.after_injection),
            serialize_runs: false,
            retry_attempts: retry.attempts,
            retry_delay_ms: duration_ms(retry.delay),
            fetch_timeout_ms: duration_ms(fetch.request_timeout),
            fetch_max_bytes: fetch.max_bytes,
            log_file: false,
        }
    }
}

impl AppConfig {
    /// Loads `explicit`, or `./jobrelay.ron` when no path is given.
    ///
    /// The default file may be absent; an explicitly named one may not.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            endpoint: self.endpoint.clone(),
            timeout: self.relay_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            budget: SettleBudget {
                after_load: Duration::from_millis(self.load_settle_ms),
                after_injection: Duration::from_millis(self.injection_settle_ms),
            },
            serialize_runs: self.serialize_runs,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_attempts.max(1),
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            request_timeout: Duration::from_millis(self.fetch_timeout_ms),
            max_bytes: self.fetch_max_bytes,
            ..FetchSettings::default()
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
