use std::path::Path;

use http::{HeaderName, HeaderValue};

use crate::Config;
use crate::provider::ProviderKind;

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

        Self::from_toml(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first problem found
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_client()?;
        self.validate_providers()?;
        self.validate_models()?;
        Ok(())
    }

    fn validate_client(&self) -> anyhow::Result<()> {
        let client = &self.client;

        if client.model.trim().is_empty() {
            anyhow::bail!("client.model must not be empty");
        }

        if client.request_timeout_ms == Some(0) {
            anyhow::bail!("client.request_timeout_ms must be greater than 0");
        }

        if let Some(ref path) = client.ca_bundle_path
            && !path.is_file()
        {
            anyhow::bail!("client.ca_bundle_path does not exist: {}", path.display());
        }

        validate_headers("client.headers", client.headers.iter())?;

        Ok(())
    }

    fn validate_providers(&self) -> anyhow::Result<()> {
        for (name, provider) in &self.providers {
            name.parse::<ProviderKind>()
                .map_err(|e| anyhow::anyhow!("invalid [providers.{name}] section: {e}"))?;

            if let Some(ref path) = provider.endpoint_path
                && !path.is_empty()
                && !path.starts_with('/')
            {
                anyhow::bail!("providers.{name}.endpoint_path must start with '/'");
            }

            validate_headers(&format!("providers.{name}.headers"), provider.headers.iter())?;
        }

        Ok(())
    }

    fn validate_models(&self) -> anyhow::Result<()> {
        for model in &self.models {
            if model.id.trim().is_empty() {
                anyhow::bail!("models entries must have a non-empty id");
            }

            if model.max_output_tokens == Some(0) {
                anyhow::bail!("model '{}' max_output_tokens must be greater than 0", model.id);
            }
        }

        Ok(())
    }
}

fn validate_headers<'a>(
    section: &str,
    headers: impl Iterator<Item = (&'a String, &'a String)>,
) -> anyhow::Result<()> {
    for (name, value) in headers {
        HeaderName::try_from(name.as_str()).map_err(|e| anyhow::anyhow!("invalid header name '{name}' in {section}: {e}"))?;
        HeaderValue::try_from(value.as_str())
            .map_err(|e| anyhow::anyhow!("invalid value for header '{name}' in {section}: {e}"))?;
    }

    Ok(())
}
