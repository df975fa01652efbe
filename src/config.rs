//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

/// How the argmax pointers on insight documents are maintained.
///
/// The counters themselves are always safe under concurrency (server-side
/// atomic increments); the pointers are not. This knob names the trade-off
/// explicitly instead of burying it in the commit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgmaxMode {
    /// Unconditional counter increments plus pointer field-sets computed from
    /// the pre-fetch snapshot. Lowest latency, no contention, but concurrent
    /// events for the same owner/period can leave a pointer computed from
    /// stale counts until the next event recomputes it.
    Incremental,
    /// Read-modify-write of the whole insight document inside a Firestore
    /// transaction. Correct argmax under concurrency, and deduplicates
    /// redelivered events, at the cost of transaction retries under
    /// contention.
    Transactional,
}

impl FromStr for ArgmaxMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incremental" => Ok(Self::Incremental),
            "transactional" => Ok(Self::Transactional),
            other => Err(ConfigError::Invalid("ARGMAX_MODE", other.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Argmax maintenance strategy for insight updates
    pub argmax_mode: ArgmaxMode,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            argmax_mode: env::var("ARGMAX_MODE")
                .unwrap_or_else(|_| "incremental".to_string())
                .parse()?,
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            argmax_mode: ArgmaxMode::Incremental,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_mode_parsing() {
        assert_eq!(
            "incremental".parse::<ArgmaxMode>().unwrap(),
            ArgmaxMode::Incremental
        );
        assert_eq!(
            "transactional".parse::<ArgmaxMode>().unwrap(),
            ArgmaxMode::Transactional
        );
        assert!("eventual".parse::<ArgmaxMode>().is_err());
    }

    #[test]
    fn test_config_from_env() {
        // Set env vars for test
        env::set_var("PORT", "9090");
        env::set_var("ARGMAX_MODE", "transactional");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.port, 9090);
        assert_eq!(config.argmax_mode, ArgmaxMode::Transactional);
    }
}
