#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Connect to a document store and confirm it answers
//!
//! The wire driver is abstracted by [`StoreDriver`]; [`connect_with_retry`]
//! runs its connect and ping calls through the shared retry loop under one
//! total deadline.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use tether_config::{StoreConfig, Topology};
use tether_error::{Result, StructuredError};
use tether_retry::{RetryPolicy, deadline_token};
use tokio_util::sync::CancellationToken;

/// Username/password pair for standalone deployments
#[derive(Debug, Clone)]
pub struct StoreCredentials {
    pub username: String,
    pub password: SecretString,
}

/// What a driver needs to open a connection
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Connection string
    pub dsn: String,
    pub database_name: String,
    /// Set for standalone deployments only
    pub credentials: Option<StoreCredentials>,
    /// Set for replica sets only
    pub replica_set: Option<String>,
}

impl ConnectOptions {
    pub fn from_config(config: &StoreConfig) -> Self {
        let (credentials, replica_set) = match &config.topology {
            Topology::Standalone { username, password, .. } => (
                Some(StoreCredentials {
                    username: username.clone(),
                    password: password.clone(),
                }),
                None,
            ),
            Topology::ReplicaSet { replica_set_name, .. } => (None, Some(replica_set_name.clone())),
        };

        Self {
            dsn: config.topology.dsn().to_owned(),
            database_name: config.database_name.clone(),
            credentials,
            replica_set,
        }
    }
}

/// Database driver seam
#[async_trait]
pub trait StoreDriver: Send + Sync {
    /// Connected handle
    type Client: Send + Sync;
    /// Driver failure
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open a connection, giving up after `timeout`
    async fn connect(&self, options: &ConnectOptions, timeout: Duration) -> std::result::Result<Self::Client, Self::Error>;

    /// Round-trip to the server, giving up after `timeout`
    async fn ping(&self, client: &Self::Client, timeout: Duration) -> std::result::Result<(), Self::Error>;
}

/// Connect then ping, each under the retry loop
///
/// Both phases share a deadline of `config.total_timeout()`; each call is
/// also bounded by its own timeout. Driver failures become `400` errors
/// carrying the driver message, expired calls become `503`.
pub async fn connect_with_retry<D: StoreDriver>(
    driver: &D,
    config: &StoreConfig,
    policy: RetryPolicy,
    cancel: &CancellationToken,
) -> Result<D::Client> {
    let options = ConnectOptions::from_config(config);
    let deadline = deadline_token(cancel, config.total_timeout());
    // Stops the deadline timer task on every exit path
    let _deadline_guard = deadline.clone().drop_guard();

    tracing::debug!(
        database = %options.database_name,
        replica_set = options.replica_set.as_deref().unwrap_or_default(),
        "connecting to store"
    );

    let connection_timeout = config.connection_timeout();
    let client = tether_retry::retry(policy, &deadline, || {
        bounded("connect", connection_timeout, driver.connect(&options, connection_timeout))
    })
    .await?;

    let request_timeout = config.request_timeout();
    tether_retry::retry(policy, &deadline, || {
        bounded("ping", request_timeout, driver.ping(&client, request_timeout))
    })
    .await?;

    tracing::debug!(database = %options.database_name, "store connection ready");

    Ok(client)
}

async fn bounded<T, E, F>(phase: &str, limit: Duration, call: F) -> Result<T>
where
    E: std::error::Error,
    F: Future<Output = std::result::Result<T, E>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(StructuredError::bad_request(format!("store {phase} failed: {e}"))),
        Err(_) => Err(StructuredError::unavailable(format!(
            "store {phase} timed out after {}s",
            limit.as_secs()
        ))),
    }
}
