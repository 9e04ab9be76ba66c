use std::path::Path;

use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tether_auth::{Credentials, authorization_header};
use tether_config::{ClientConfig, ClientTlsConfig};
use tether_error::{Result, StructuredError};
use tether_retry::RetryPolicy;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::template::RequestTemplate;

/// HTTP client for one backend
///
/// Headers are resolved once at construction and sent with every request.
/// Cloning is cheap and clones share the connection pool.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    /// Build a client from static credentials
    ///
    /// A `PKCE` source is rejected here; use [`RestClient::connect`].
    pub fn new(config: &ClientConfig, content_type: &str) -> Result<Self> {
        let credentials = Credentials::from_config(&config.auth)?;
        Self::with_credentials(config, &credentials, content_type)
    }

    /// Build a client, running the PKCE exchange first when configured
    pub async fn connect(
        config: &ClientConfig,
        content_type: &str,
        policy: RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let credentials = Credentials::from_config(&config.auth)?
            .exchange(policy, cancel)
            .await?;

        Self::with_credentials(config, &credentials, content_type)
    }

    /// Build a client from already resolved credentials
    pub fn with_credentials(config: &ClientConfig, credentials: &Credentials, content_type: &str) -> Result<Self> {
        let mut base_url = config.base_url.clone();
        let authorization = authorization_header(credentials, &mut base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(content_type)
                .map_err(|e| StructuredError::internal(format!("invalid content type '{content_type}': {e}")))?,
        );

        let builder = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connection_timeout())
            .timeout(config.request_timeout());

        let http = configure_tls(builder, &config.tls)?
            .build()
            .map_err(|e| StructuredError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, base_url })
    }

    /// Base URL with any userinfo removed
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send a templated request and decode a `200` JSON response
    ///
    /// Any other status yields an error carrying that status; the body of a
    /// failed response is not read.
    pub async fn request<T: DeserializeOwned>(&self, template: &RequestTemplate) -> Result<T> {
        let url = self.endpoint(template)?;
        let response = self.send(template, &url).await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(StructuredError::http(response.status()).with_uri(url.path()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| StructuredError::internal(format!("failed to read response body: {e}")))?;

        serde_json::from_slice(&body)
            .map_err(|e| StructuredError::internal(format!("failed to decode response body: {e}")))
    }

    /// Resolve the template against the base path
    ///
    /// A `?query` suffix in the rendered pattern replaces the base URL query.
    pub(crate) fn endpoint(&self, template: &RequestTemplate) -> Result<Url> {
        let rendered = template.render()?;
        let (path, query) = match rendered.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rendered.as_str(), None),
        };

        let mut url = self.base_url.clone();
        if url.cannot_be_a_base() {
            return Err(StructuredError::internal(format!("base URL {url} cannot carry a path")));
        }

        url.set_path(&join_paths(self.base_url.path(), path));
        url.set_query(query);
        url.set_fragment(None);

        Ok(url)
    }

    pub(crate) async fn send(&self, template: &RequestTemplate, url: &Url) -> Result<reqwest::Response> {
        let mut request = self.http.request(template.method().clone(), url.clone());

        if let Some(body) = template.body() {
            request = request.body(body.to_owned());
        }

        tracing::debug!(method = %template.method(), path = url.path(), "sending request");

        request
            .send()
            .await
            .map_err(|e| StructuredError::unavailable(e.to_string()).with_uri(url.path()))
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

fn configure_tls(mut builder: reqwest::ClientBuilder, tls: &ClientTlsConfig) -> Result<reqwest::ClientBuilder> {
    if let Some(ref certificate) = tls.certificate {
        let Some(ref private_key) = tls.private_key else {
            return Err(StructuredError::internal(
                "a private key must be provided with the client certificate",
            ));
        };

        let mut pem = read_pem(certificate)?;
        pem.extend(read_pem(private_key)?);

        let identity = reqwest::Identity::from_pem(&pem)
            .map_err(|e| StructuredError::internal(format!("invalid client identity: {e}")))?;
        builder = builder.identity(identity);
    }

    if let Some(ref ca) = tls.ca {
        let certificate = reqwest::Certificate::from_pem(&read_pem(ca)?).map_err(|e| {
            StructuredError::internal(format!("could not parse certificate from {}: {e}", ca.display()))
        })?;
        builder = builder.add_root_certificate(certificate);
    }

    if tls.disable_endpoint_verification {
        tracing::warn!(
            "endpoint verification is disabled; this setting should be used for development purposes only"
        );
        builder = builder.danger_accept_invalid_certs(true);
    }

    Ok(builder)
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| StructuredError::internal(format!("failed to read {}: {e}", path.display())))
}

/// Join and clean two URL paths, resolving `.` and `..`
fn join_paths(base: &str, relative: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in base.split('/').chain(relative.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("/{}", segments.join("/"))
}
