use std::path::Path;

use secrecy::ExposeSecret;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let expanded =
            crate::env::expand_env(&raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if the client or store sections are inconsistent
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_client_config()?;
        self.validate_store_config()?;
        Ok(())
    }

    fn validate_client_config(&self) -> anyhow::Result<()> {
        let Some(ref client) = self.client else {
            return Ok(());
        };

        if !matches!(client.base_url.scheme(), "http" | "https") {
            anyhow::bail!("client.base_url must use http or https, got '{}'", client.base_url.scheme());
        }

        if client.tls.certificate.is_some() != client.tls.private_key.is_some() {
            anyhow::bail!("client.tls.certificate and client.tls.private_key must be set together");
        }

        if client.connection_timeout_ms == 0 || client.request_timeout_ms == 0 {
            anyhow::bail!("client timeouts must be greater than 0");
        }

        match client.auth.source.to_ascii_uppercase().as_str() {
            "URL" => {}
            "BEARER" => {
                let has_token = client.auth.token.as_ref().is_some_and(|t| !t.expose_secret().trim().is_empty());
                if !has_token {
                    anyhow::bail!("client.auth.token must be set when auth.source is BEARER");
                }
            }
            "PKCE" => {
                if client.auth.pkce.is_none() {
                    anyhow::bail!("client.auth.pkce must be configured when auth.source is PKCE");
                }
            }
            other => anyhow::bail!("unrecognized client.auth.source '{other}'"),
        }

        Ok(())
    }

    fn validate_store_config(&self) -> anyhow::Result<()> {
        let Some(ref store) = self.store else {
            return Ok(());
        };

        if store.database_name.trim().is_empty() {
            anyhow::bail!("store.database_name must not be empty");
        }

        if store.topology.dsn().is_empty() {
            anyhow::bail!("store.topology.url must not be empty");
        }

        if store.total_timeout_secs == 0 {
            anyhow::bail!("store.total_timeout_secs must be greater than 0");
        }

        Ok(())
    }
}
