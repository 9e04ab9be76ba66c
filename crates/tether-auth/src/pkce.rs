//! OAuth2 authorization code exchange with PKCE (RFC 7636, `S256`)
//!
//! The flow posts the authorization request, reads back `{"code": "..."}`
//! and trades the code for a token at the token endpoint. The token
//! endpoint's body is kept verbatim as the bearer token, whatever the
//! response status.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use reqwest::header::{ACCEPT_ENCODING, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tether_config::PkceConfig;
use tether_error::{Result, StructuredError};
use tether_retry::RetryPolicy;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Challenge method sent with every authorization request
pub const CODE_CHALLENGE_METHOD: &str = "S256";

const GRANT_TYPE: &str = "authorization_code";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Random 32-byte verifier, base64url without padding (43 characters)
pub fn generate_code_verifier() -> String {
    let random_bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// `BASE64URL(SHA256(verifier))` without padding
pub fn generate_code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Random 16-byte state, base64url without padding
pub fn generate_state() -> String {
    let random_bytes: [u8; 16] = rand::random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

#[derive(Deserialize)]
struct AuthorizationCode {
    code: String,
}

/// One-shot authorization code exchange
///
/// [`PkceFlow::authenticate`] consumes the flow; re-authenticating needs a
/// new one.
pub struct PkceFlow {
    http: reqwest::Client,
    config: PkceConfig,
    code_verifier: SecretString,
    state: String,
}

impl PkceFlow {
    /// Prepare a flow, generating the verifier and state when not configured
    pub fn new(config: PkceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| StructuredError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(http, config))
    }

    /// Prepare a flow that sends its requests through `http`
    pub fn with_client(http: reqwest::Client, config: PkceConfig) -> Self {
        let code_verifier = config
            .code_verifier
            .clone()
            .unwrap_or_else(|| SecretString::from(generate_code_verifier()));
        let state = config.state.clone().unwrap_or_else(generate_state);

        Self {
            http,
            config,
            code_verifier,
            state,
        }
    }

    pub fn code_challenge(&self) -> String {
        generate_code_challenge(self.code_verifier.expose_secret())
    }

    /// Authorization endpoint with the PKCE query attached
    ///
    /// Scope entries are joined with `", "`, which form-encodes to `%2C+`.
    pub fn authorization_url(&self) -> Result<Url> {
        let base = format!(
            "{}/{}",
            self.config.auth_server_url.as_str().trim_end_matches('/'),
            self.config.path.trim_start_matches('/')
        );

        let mut url = Url::parse(&base)
            .map_err(|e| StructuredError::internal(format!("invalid authorization URL {base}: {e}")))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("code_challenge", &self.code_challenge())
            .append_pair("code_challenge_method", CODE_CHALLENGE_METHOD)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &scope_param(&self.config.scope))
            .append_pair("state", &self.state)
            .append_pair("role", &self.config.role);

        Ok(url)
    }

    /// Run the exchange under the retry loop and return the bearer token
    ///
    /// Each attempt starts again from the authorization request.
    pub async fn authenticate(self, policy: RetryPolicy, cancel: &CancellationToken) -> Result<SecretString> {
        let authorization_url = self.authorization_url()?;

        tracing::debug!(
            client_id = %self.config.client_id,
            token_url = %self.config.token_url,
            "starting PKCE exchange"
        );

        let token = tether_retry::retry(policy, cancel, || self.query_token(&authorization_url)).await?;

        tracing::debug!(client_id = %self.config.client_id, "PKCE exchange complete");

        Ok(token)
    }

    async fn query_token(&self, authorization_url: &Url) -> Result<SecretString> {
        let code = self.request_code(authorization_url).await?;
        self.exchange_code(&code).await
    }

    async fn request_code(&self, authorization_url: &Url) -> Result<String> {
        let response = self
            .http
            .post(authorization_url.clone())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body("")
            .send()
            .await
            .map_err(|e| StructuredError::bad_request(format!("authorization request failed: {e}")))?;

        if response.status() != reqwest::StatusCode::OK {
            tracing::debug!(status = %response.status(), "authorization request rejected");
            return Err(StructuredError::http(response.status()).with_uri(authorization_url.path()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| StructuredError::internal(format!("failed to read authorization response: {e}")))?;

        let AuthorizationCode { code } = serde_json::from_slice(&body)
            .map_err(|e| StructuredError::internal(format!("failed to parse authorization response: {e}")))?;

        Ok(code)
    }

    async fn exchange_code(&self, code: &str) -> Result<SecretString> {
        let form = [
            ("code", code),
            ("code_verifier", self.code_verifier.expose_secret()),
            ("grant_type", GRANT_TYPE),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("sub", self.config.client_id.as_str()),
            ("role", self.config.role.as_str()),
        ];

        let response = self
            .http
            .post(self.config.token_url.clone())
            .basic_auth(&self.config.client_id, Some(self.config.client_secret.expose_secret()))
            .header(ACCEPT_ENCODING, "gzip")
            .form(&form)
            .send()
            .await
            .map_err(|e| StructuredError::bad_request(format!("token request failed: {e}")))?;

        // The token response is opaque; whatever body arrives is the token
        tracing::debug!(status = %response.status(), "token response received");

        let body = response
            .text()
            .await
            .map_err(|e| StructuredError::internal(format!("failed to read token response: {e}")))?;

        Ok(SecretString::from(body))
    }
}

fn scope_param(scope: &str) -> String {
    scope
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
