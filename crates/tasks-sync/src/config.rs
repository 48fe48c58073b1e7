//! Save pipeline configuration.
//!
//! Read from environment variables:
//! - `TASKS_MODE`: `online` (default) or `offline`
//! - `TASKS_DB_PATH`: offline archive path (default: "tasks.db")
//! - `TASKS_SERVER_URL`: server base URL (default: "http://localhost:8080")
//! - `TASKS_COMMIT_TIMEOUT_SECS`: per-commit timeout in seconds (default: 30,
//!   `0` disables the timeout)

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_DB_PATH: &str = "tasks.db";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";
pub const DEFAULT_COMMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where records are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Persisted to the local SQLite archive.
    Offline,
    /// Persisted to the remote tasks server.
    #[default]
    Online,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "offline" => Ok(Mode::Offline),
            "online" => Ok(Mode::Online),
            _ => Err("expected 'online' or 'offline'".to_string()),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Offline => f.write_str("offline"),
            Mode::Online => f.write_str("online"),
        }
    }
}

/// Invalid configuration value.
#[derive(Debug, Error)]
#[error("invalid value for {var}: '{value}' ({reason})")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub mode: Mode,
    pub db_path: String,
    pub server_url: String,
    /// `None` waits on a commit forever.
    pub commit_timeout: Option<Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            mode: Mode::default(),
            db_path: DEFAULT_DB_PATH.to_string(),
            server_url: DEFAULT_SERVER_URL.to_string(),
            commit_timeout: Some(DEFAULT_COMMIT_TIMEOUT),
        }
    }
}

impl SyncConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults
    /// for unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = SyncConfig::default();

        if let Some(value) = lookup("TASKS_MODE") {
            config.mode = value.parse().map_err(|reason| ConfigError {
                var: "TASKS_MODE",
                value: value.clone(),
                reason,
            })?;
        }
        if let Some(value) = lookup("TASKS_DB_PATH") {
            config.db_path = value;
        }
        if let Some(value) = lookup("TASKS_SERVER_URL") {
            config.server_url = value;
        }
        if let Some(value) = lookup("TASKS_COMMIT_TIMEOUT_SECS") {
            let secs: u64 = value.trim().parse().map_err(|e| ConfigError {
                var: "TASKS_COMMIT_TIMEOUT_SECS",
                value: value.clone(),
                reason: format!("{e}"),
            })?;
            config.commit_timeout = timeout_from_secs(secs);
        }

        Ok(config)
    }
}

/// `0` means no timeout.
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = SyncConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.mode, Mode::Online);
        assert_eq!(config.commit_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn every_variable_is_honoured() {
        let config = SyncConfig::from_lookup(lookup(&[
            ("TASKS_MODE", "Offline"),
            ("TASKS_DB_PATH", "/tmp/t.db"),
            ("TASKS_SERVER_URL", "https://tasks.example"),
            ("TASKS_COMMIT_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.mode, Mode::Offline);
        assert_eq!(config.db_path, "/tmp/t.db");
        assert_eq!(config.server_url, "https://tasks.example");
        assert_eq!(config.commit_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn zero_timeout_disables_it() {
        let config =
            SyncConfig::from_lookup(lookup(&[("TASKS_COMMIT_TIMEOUT_SECS", "0")])).unwrap();
        assert_eq!(config.commit_timeout, None);
    }

    #[test]
    fn bad_values_are_reported() {
        let err = SyncConfig::from_lookup(lookup(&[("TASKS_MODE", "sideways")])).unwrap_err();
        assert_eq!(err.var, "TASKS_MODE");

        let err = SyncConfig::from_lookup(lookup(&[("TASKS_COMMIT_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert_eq!(err.var, "TASKS_COMMIT_TIMEOUT_SECS");
        assert_eq!(err.value, "soon");
    }
}
