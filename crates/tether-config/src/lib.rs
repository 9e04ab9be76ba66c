#![allow(clippy::must_use_candidate)]

pub mod client;
mod env;
pub mod environment;
mod loader;
pub mod retry;
pub mod store;
pub mod telemetry;

use serde::Deserialize;

pub use client::*;
pub use environment::Environment;
pub use retry::RetryConfig;
pub use store::*;
pub use telemetry::*;

/// Top-level tether configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Deployment environment, used for log format defaults and telemetry
    #[serde(default)]
    pub environment: Environment,
    /// REST client configuration
    #[serde(default)]
    pub client: Option<ClientConfig>,
    /// Backoff shared by REST and store retries
    #[serde(default)]
    pub retry: RetryConfig,
    /// Document store configuration
    #[serde(default)]
    pub store: Option<StoreConfig>,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
