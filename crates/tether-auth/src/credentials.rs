use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};
use http::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use tether_config::{AuthConfig, AuthScheme, PkceConfig};
use tether_error::{Result, StructuredError};
use tether_retry::RetryPolicy;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::pkce::PkceFlow;

/// Where the `Authorization` header value comes from
#[derive(Clone)]
pub enum Credentials {
    /// `Basic` credentials taken from the target URL userinfo
    Url,
    /// Static token sent as `{scheme} {token}`
    Bearer { scheme: AuthScheme, token: SecretString },
    /// Token obtained through the PKCE exchange; see [`Credentials::exchange`]
    Pkce(PkceConfig),
}

impl Credentials {
    /// Resolve the configured source selector (case-insensitive)
    ///
    /// A `BEARER` source without a token yields an empty token.
    pub fn from_config(auth: &AuthConfig) -> Result<Self> {
        match auth.source.trim().to_ascii_uppercase().as_str() {
            "URL" => Ok(Self::Url),
            "BEARER" => {
                let token = auth
                    .token
                    .clone()
                    .unwrap_or_else(|| SecretString::from(String::new()));

                Ok(Self::Bearer {
                    scheme: auth.scheme,
                    token,
                })
            }
            "PKCE" => match &auth.pkce {
                Some(pkce) => Ok(Self::Pkce(pkce.clone())),
                None => Err(StructuredError::bad_request("PKCE credentials source requires pkce settings")),
            },
            other => Err(StructuredError::bad_request(format!(
                "unrecognized value for credentials source {other}"
            ))),
        }
    }

    /// Run the PKCE exchange, turning `Pkce` into `Bearer`
    ///
    /// Other variants are returned unchanged.
    pub async fn exchange(self, policy: RetryPolicy, cancel: &CancellationToken) -> Result<Self> {
        let Self::Pkce(config) = self else {
            return Ok(self);
        };

        let token = PkceFlow::new(config)?.authenticate(policy, cancel).await?;

        Ok(Self::Bearer {
            scheme: AuthScheme::Bearer,
            token,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url => f.write_str("Url"),
            Self::Bearer { scheme, .. } => f.debug_struct("Bearer").field("scheme", scheme).finish_non_exhaustive(),
            Self::Pkce(config) => f.debug_tuple("Pkce").field(&config.client_id).finish(),
        }
    }
}

/// Compute the `Authorization` header for requests to `url`
///
/// Userinfo is removed from `url` whatever the outcome, so it is never sent
/// alongside the header.
pub fn authorization_header(credentials: &Credentials, url: &mut Url) -> Result<HeaderValue> {
    let value = match credentials {
        Credentials::Url => basic_from_userinfo(url),
        Credentials::Bearer { scheme, token } => {
            let token = token.expose_secret().trim().trim_matches('"');
            Ok(format!("{scheme} {token}"))
        }
        Credentials::Pkce(_) => Err(StructuredError::bad_request(
            "PKCE credentials must be exchanged before building the header",
        )),
    };

    strip_userinfo(url);

    let mut header = HeaderValue::from_str(&value?)
        .map_err(|e| StructuredError::internal(format!("invalid authorization header: {e}")))?;
    header.set_sensitive(true);

    Ok(header)
}

fn basic_from_userinfo(url: &Url) -> Result<String> {
    if url.username().is_empty() && url.password().is_none() {
        return Err(StructuredError::bad_request("target URL carries no userinfo"));
    }

    let userinfo = match url.password() {
        Some(password) => format!("{}:{password}", url.username()),
        None => url.username().to_owned(),
    };

    Ok(format!("Basic {}", STANDARD.encode(userinfo)))
}

fn strip_userinfo(url: &mut Url) {
    // Only fails for URLs without a host, which carry no userinfo either
    let _ = url.set_username("");
    let _ = url.set_password(None);
}
