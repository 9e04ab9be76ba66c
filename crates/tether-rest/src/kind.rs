use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::de::DeserializeOwned;
use tether_error::{Result, StructuredError};
use tether_retry::RetryPolicy;
use tokio_util::sync::CancellationToken;

use crate::client::RestClient;
use crate::template::RequestTemplate;

const MISSING_DESTINATION: &str = "path to write is missing";

/// Which client operation a retried call runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// [`RestClient::request`]
    Json,
    /// [`RestClient::download_multipart`]
    Multipart,
}

impl FromStr for RequestKind {
    type Err = StructuredError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "multipart" => Ok(Self::Multipart),
            _ => Err(StructuredError::bad_request(format!("invalid request kind '{s}'"))),
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Multipart => f.write_str("multipart"),
        }
    }
}

/// Result of [`RestClient::execute_with_retry`]
#[derive(Debug)]
pub enum Outcome<T> {
    Json(T),
    Files(Vec<PathBuf>),
}

impl RestClient {
    /// Run the operation selected by `kind` under the retry loop
    ///
    /// `Multipart` needs a non-empty `destination`; without one the call
    /// fails before any request is sent.
    pub async fn execute_with_retry<T: DeserializeOwned>(
        &self,
        kind: RequestKind,
        template: &RequestTemplate,
        destination: Option<&Path>,
        policy: RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<Outcome<T>> {
        match kind {
            RequestKind::Json => self
                .request_with_retry(template, policy, cancel)
                .await
                .map(Outcome::Json),
            RequestKind::Multipart => {
                let Some(destination) = destination else {
                    return Err(StructuredError::bad_request(MISSING_DESTINATION));
                };

                self.download_with_retry(template, destination, policy, cancel)
                    .await
                    .map(Outcome::Files)
            }
        }
    }

    /// [`RestClient::request`] under the retry loop
    pub async fn request_with_retry<T: DeserializeOwned>(
        &self,
        template: &RequestTemplate,
        policy: RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<T> {
        tether_retry::retry(policy, cancel, || self.request::<T>(template)).await
    }

    /// [`RestClient::download_multipart`] under the retry loop
    pub async fn download_with_retry(
        &self,
        template: &RequestTemplate,
        destination: &Path,
        policy: RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<Vec<PathBuf>> {
        if destination.as_os_str().is_empty() {
            return Err(StructuredError::bad_request(MISSING_DESTINATION));
        }

        tether_retry::retry(policy, cancel, || self.download_multipart(template, destination)).await
    }
}
