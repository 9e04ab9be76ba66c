//! Configuration fixtures for integration tests

use std::io::Write;

use tether_config::{AuthScheme, ClientConfig, Config, PkceConfig};
use url::Url;

use super::mock_auth::{CLIENT_ID, CLIENT_SECRET, MockAuthServer};

/// Client settings using a static bearer token
pub fn bearer_client(base_url: &str, token: &str) -> ClientConfig {
    ClientConfig::new(base_url.parse().expect("valid URL")).with_token(AuthScheme::Bearer, token)
}

/// PKCE settings pointing at a mock authorization server
pub fn pkce_settings(auth: &MockAuthServer) -> PkceConfig {
    let mut pkce = PkceConfig::new(
        Url::parse(&auth.base_url()).expect("valid URL"),
        Url::parse(&auth.token_url()).expect("valid URL"),
        "http://localhost:50001",
        CLIENT_ID,
        CLIENT_SECRET,
    );
    pkce.scope = "read, openid".to_owned();
    pkce
}

/// Write `contents` to a temporary TOML file and load it
pub fn load_toml(contents: &str) -> anyhow::Result<Config> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    file.write_all(contents.as_bytes())?;
    Config::load(file.path())
}
