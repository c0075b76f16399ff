use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;
use secrecy::SecretString;
use url::Url;

use crate::Config;
use crate::provider::{MaxTokensField, MessageFormat, ProviderKind, ProviderOverride, model_defaults};

/// Request budget used when `request_timeout_ms` is unset
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Client settings after override precedence has been applied
///
/// Built once; nothing in a request mutates it.
#[derive(Debug, Clone)]
pub struct ResolvedClient {
    /// Provider preset in use
    pub provider: ProviderKind,
    /// Model identifier
    pub model: String,
    /// Bearer token, if any
    pub api_key: Option<SecretString>,
    /// Base URL
    pub base_url: Url,
    /// Full URL requests are posted to
    pub endpoint: Url,
    /// Conversation wire shape
    pub format: MessageFormat,
    /// Whether to request an event stream
    pub stream: bool,
    /// Body field carrying the output token limit
    pub max_tokens_field: MaxTokensField,
    /// Extra headers, lower-cased names
    pub headers: IndexMap<String, String>,
    /// PEM bundle of extra trust anchors
    pub ca_bundle_path: Option<PathBuf>,
    /// End-to-end request budget
    pub request_timeout: Duration,
    /// System prompt for one-shot prompt completion
    pub system_prompt: String,
    /// Default sampling temperature
    pub temperature: Option<f64>,
}

impl Config {
    /// Resolve the effective client settings
    ///
    /// Every field is taken from `[providers.<provider>]` first, then
    /// `[client]`, then the built-in preset. Format and streaming defaults
    /// implied by the model id sit between the preset and explicit overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL can be determined or the endpoint URL
    /// is not http(s)
    pub fn resolve(&self) -> anyhow::Result<ResolvedClient> {
        let client = &self.client;
        let provider = client.provider;
        let preset = provider.preset();

        let fallback = ProviderOverride::default();
        let specific = self.providers.get(provider.as_str()).unwrap_or(&fallback);

        let base_url = match specific.base_url.as_ref().or(client.base_url.as_ref()) {
            Some(url) => url.clone(),
            None if preset.base_url.is_empty() => {
                anyhow::bail!("provider '{provider}' requires client.base_url or providers.{provider}.base_url")
            }
            None => Url::parse(preset.base_url)?,
        };

        let endpoint_path = specific.endpoint_path.as_deref().unwrap_or(preset.endpoint_path);
        let endpoint = join_endpoint(&base_url, endpoint_path)?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            anyhow::bail!("endpoint {endpoint} must use http or https");
        }

        let (model_format, model_stream) = model_defaults(&client.model);

        let mut headers: IndexMap<String, String> = IndexMap::new();
        for (name, value) in client.headers.iter().chain(&specific.headers) {
            headers.insert(name.to_ascii_lowercase(), value.clone());
        }

        let resolved = ResolvedClient {
            provider,
            model: client.model.clone(),
            api_key: specific.api_key.clone().or_else(|| client.api_key.clone()),
            base_url,
            endpoint,
            format: specific.format.or(model_format).unwrap_or(preset.format),
            stream: specific.stream.or(model_stream).unwrap_or(preset.stream),
            max_tokens_field: specific.max_tokens_field.unwrap_or(preset.max_tokens_field),
            headers,
            ca_bundle_path: client.ca_bundle_path.clone(),
            request_timeout: client
                .request_timeout_ms
                .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_millis),
            system_prompt: client.system_prompt.clone().unwrap_or_default(),
            temperature: client.temperature,
        };

        tracing::debug!(
            provider = %resolved.provider,
            model = %resolved.model,
            endpoint = %resolved.endpoint,
            format = ?resolved.format,
            stream = resolved.stream,
            "resolved client configuration"
        );

        Ok(resolved)
    }
}

fn join_endpoint(base_url: &Url, path: &str) -> anyhow::Result<Url> {
    if path.is_empty() {
        return Ok(base_url.clone());
    }

    let base = base_url.as_str().trim_end_matches('/');
    Url::parse(&format!("{base}{path}")).map_err(|e| anyhow::anyhow!("invalid endpoint URL {base}{path}: {e}"))
}
