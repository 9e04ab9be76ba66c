use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

/// Document store connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Database owned by this service
    pub database_name: String,
    /// Per-attempt connect timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,
    /// Per-attempt ping timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Budget for connect and ping including every retry, in seconds
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Deployment shape of the store
    pub topology: Topology,
}

impl StoreConfig {
    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub const fn total_timeout(&self) -> Duration {
        Duration::from_secs(self.total_timeout_secs)
    }
}

/// How the store is deployed, and what each shape needs to connect
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Topology {
    /// Single node reached with username/password credentials
    Standalone {
        url: String,
        username: String,
        password: SecretString,
    },
    /// Replica set; credentials are carried by the connection string
    ReplicaSet { url: String, replica_set_name: String },
}

impl Topology {
    /// Connection string for the driver
    pub fn dsn(&self) -> &str {
        match self {
            Self::Standalone { url, .. } | Self::ReplicaSet { url, .. } => url,
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_connection_timeout() -> u64 {
    10
}

#[allow(clippy::missing_const_for_fn)]
fn default_request_timeout() -> u64 {
    30
}

#[allow(clippy::missing_const_for_fn)]
fn default_total_timeout() -> u64 {
    300
}
