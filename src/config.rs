//! # Relay Configuration
//!
//! Environment-driven configuration for the relay core. All operational knobs
//! carry production defaults and can be overridden through `RELAY_*`
//! environment variables (e.g. `RELAY_BASE_URL`, `RELAY_POLL_MAX_ATTEMPTS`).
//!
//! Credential secrets are loaded separately from numbered environment
//! variables (`RELAY_API_KEY_1` through `RELAY_API_KEY_10`, plus the bare
//! `RELAY_API_KEY`), deduplicated while preserving order — insertion order is
//! significant because it defines the round-robin rotation order.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{info, warn};

use crate::constants;
use crate::error::{RelayError, Result};

/// Operational configuration for the relay core.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    /// Base URL of the external provider API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-call timeout for outbound requests, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Base delay between dispatch attempts, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Credential cooldown after quota exhaustion, in seconds.
    #[serde(default = "default_quota_cooldown_secs")]
    pub quota_cooldown_secs: u64,

    /// Credential cooldown after rate limiting, in seconds.
    #[serde(default = "default_rate_limit_cooldown_secs")]
    pub rate_limit_cooldown_secs: u64,

    /// Credential cooldown after a generic transient failure, in seconds.
    #[serde(default = "default_transient_cooldown_secs")]
    pub transient_cooldown_secs: u64,

    /// Exponent cap for exponential backoff between attempts.
    #[serde(default = "default_max_backoff_exponent")]
    pub max_backoff_exponent: u32,

    /// Maximum polling rounds per enrichment job.
    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,

    /// Delay before each polling round, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_base_url() -> String {
    "https://api.surfe.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    constants::DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_retry_delay_ms() -> u64 {
    constants::DEFAULT_RETRY_DELAY.as_millis() as u64
}

fn default_quota_cooldown_secs() -> u64 {
    constants::cooldown::QUOTA_EXCEEDED.as_secs()
}

fn default_rate_limit_cooldown_secs() -> u64 {
    constants::cooldown::RATE_LIMITED.as_secs()
}

fn default_transient_cooldown_secs() -> u64 {
    constants::cooldown::TRANSIENT_FAILURE.as_secs()
}

fn default_max_backoff_exponent() -> u32 {
    constants::MAX_BACKOFF_EXPONENT
}

fn default_poll_max_attempts() -> u32 {
    constants::DEFAULT_POLL_MAX_ATTEMPTS
}

fn default_poll_interval_secs() -> u64 {
    constants::DEFAULT_POLL_INTERVAL.as_secs()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            retry_delay_ms: default_retry_delay_ms(),
            quota_cooldown_secs: default_quota_cooldown_secs(),
            rate_limit_cooldown_secs: default_rate_limit_cooldown_secs(),
            transient_cooldown_secs: default_transient_cooldown_secs(),
            max_backoff_exponent: default_max_backoff_exponent(),
            poll_max_attempts: default_poll_max_attempts(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl RelayConfig {
    /// Load configuration from `RELAY_*` environment variables, falling back
    /// to production defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("RELAY"))
            .build()
            .map_err(|e| RelayError::ConfigurationError(format!("failed to read environment: {e}")))?;

        let config: RelayConfig = settings
            .try_deserialize()
            .map_err(|e| RelayError::ConfigurationError(format!("invalid configuration value: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate invariants that serde defaults alone cannot enforce.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(RelayError::ConfigurationError(
                "base_url must not be empty".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(RelayError::ConfigurationError(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.poll_max_attempts == 0 {
            return Err(RelayError::ConfigurationError(
                "poll_max_attempts must be positive".to_string(),
            ));
        }
        if self.max_backoff_exponent > 20 {
            return Err(RelayError::ConfigurationError(
                "max_backoff_exponent must be 20 or less".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn quota_cooldown(&self) -> Duration {
        Duration::from_secs(self.quota_cooldown_secs)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }

    pub fn transient_cooldown(&self) -> Duration {
        Duration::from_secs(self.transient_cooldown_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Load credential secrets from the environment.
///
/// Checks `RELAY_API_KEY_1` through `RELAY_API_KEY_10` and then the bare
/// `RELAY_API_KEY`, trimming whitespace and dropping duplicates while
/// preserving first-seen order.
pub fn load_credential_secrets() -> Vec<String> {
    let mut secrets: Vec<String> = Vec::new();

    for i in 1..=10 {
        let var_name = format!("RELAY_API_KEY_{i}");
        if let Ok(value) = env::var(&var_name) {
            let trimmed = value.trim();
            if !trimmed.is_empty() && !secrets.iter().any(|s| s == trimmed) {
                secrets.push(trimmed.to_string());
                info!(source = %var_name, "🔑 Loaded credential secret");
            }
        }
    }

    if let Ok(value) = env::var("RELAY_API_KEY") {
        let trimmed = value.trim();
        if !trimmed.is_empty() && !secrets.iter().any(|s| s == trimmed) {
            secrets.push(trimmed.to_string());
            info!(source = "RELAY_API_KEY", "🔑 Loaded credential secret");
        }
    }

    if secrets.is_empty() {
        warn!("No credential secrets found in environment");
    }

    secrets
}
