use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Default connect and request timeout
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// REST client settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL every request template is joined with
    pub base_url: Url,
    /// Where the `Authorization` header comes from
    #[serde(default)]
    pub auth: AuthConfig,
    /// Client certificate, CA and verification settings
    #[serde(default)]
    pub tls: ClientTlsConfig,
    /// TCP connect timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub connection_timeout_ms: u64,
    /// Whole-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ClientConfig {
    /// Settings with URL-embedded credentials and default timeouts
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            auth: AuthConfig::default(),
            tls: ClientTlsConfig::default(),
            connection_timeout_ms: DEFAULT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Use a static token sent as `{scheme} {token}`
    #[must_use]
    pub fn with_token(mut self, scheme: AuthScheme, token: impl Into<String>) -> Self {
        self.auth = AuthConfig {
            source: "BEARER".to_owned(),
            scheme,
            token: Some(SecretString::from(token.into())),
            pkce: None,
        };
        self
    }

    /// Obtain a bearer token through the PKCE exchange
    #[must_use]
    pub fn with_pkce(mut self, pkce: PkceConfig) -> Self {
        self.auth = AuthConfig {
            source: "PKCE".to_owned(),
            scheme: AuthScheme::Bearer,
            token: None,
            pkce: Some(pkce),
        };
        self
    }

    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Authorization header source
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Source selector: `URL`, `BEARER` or `PKCE` (case-insensitive)
    #[serde(default = "default_source")]
    pub source: String,
    /// Scheme prefix for token credentials
    #[serde(default)]
    pub scheme: AuthScheme,
    /// Static token for the `BEARER` source
    #[serde(default)]
    pub token: Option<SecretString>,
    /// Exchange settings for the `PKCE` source
    #[serde(default)]
    pub pkce: Option<PkceConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            scheme: AuthScheme::default(),
            token: None,
            pkce: None,
        }
    }
}

/// `Authorization` header scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum AuthScheme {
    Basic,
    #[default]
    Bearer,
}

impl AuthScheme {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Bearer => "Bearer",
        }
    }
}

impl std::fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-side TLS material
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientTlsConfig {
    /// PEM client certificate
    #[serde(default)]
    pub certificate: Option<PathBuf>,
    /// PEM private key for `certificate`
    #[serde(default)]
    pub private_key: Option<PathBuf>,
    /// Additional PEM root certificate
    #[serde(default)]
    pub ca: Option<PathBuf>,
    /// Skip server certificate verification (development only)
    #[serde(default)]
    pub disable_endpoint_verification: bool,
}

/// OAuth2 authorization-code-with-PKCE settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PkceConfig {
    /// Authorization server base URL, e.g. `http://localhost:9096/v1`
    pub auth_server_url: Url,
    /// Authorization endpoint path below `auth_server_url`
    #[serde(default = "default_authorize_path")]
    pub path: String,
    /// Token endpoint
    pub token_url: Url,
    /// Redirect URI registered for the client
    pub redirect_uri: String,
    /// Code verifier; generated when absent
    #[serde(default)]
    pub code_verifier: Option<SecretString>,
    pub client_id: String,
    pub client_secret: SecretString,
    /// Requested scopes, comma or whitespace separated
    #[serde(default)]
    pub scope: String,
    /// Opaque state; generated when absent
    #[serde(default)]
    pub state: Option<String>,
    /// Role claimed by this client
    #[serde(default = "default_role")]
    pub role: String,
}

impl PkceConfig {
    /// Settings with defaults for everything but the endpoints and client credentials
    pub fn new(
        auth_server_url: Url,
        token_url: Url,
        redirect_uri: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            auth_server_url,
            path: default_authorize_path(),
            token_url,
            redirect_uri: redirect_uri.into(),
            code_verifier: None,
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            scope: String::new(),
            state: None,
            role: default_role(),
        }
    }
}

fn default_source() -> String {
    "URL".to_owned()
}

fn default_authorize_path() -> String {
    "apiauth".to_owned()
}

fn default_role() -> String {
    "APIserver".to_owned()
}

#[allow(clippy::missing_const_for_fn)]
fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}
