use std::time::Duration;

use serde::Deserialize;

/// Backoff settings shared by every retried operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Retries after the initial attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff step in seconds; retry `r` waits `base_delay_secs * (r + 1)`
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
}

impl RetryConfig {
    /// Backoff step as a [`Duration`]
    pub const fn base_delay(&self) -> Duration {
        Duration::from_secs(self.base_delay_secs)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_secs: default_base_delay_secs(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_retries() -> u32 {
    3
}

#[allow(clippy::missing_const_for_fn)]
fn default_base_delay_secs() -> u64 {
    1
}
