use std::path::PathBuf;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

use crate::provider::ProviderKind;

/// Generic client settings shared by every provider
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Provider preset to start from
    #[serde(default)]
    pub provider: ProviderKind,
    /// Model identifier sent in the request body
    #[serde(default)]
    pub model: String,
    /// Bearer token attached as `Authorization`
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override applied to any provider
    #[serde(default)]
    pub base_url: Option<Url>,
    /// PEM bundle of extra trust anchors for HTTPS endpoints
    #[serde(default)]
    pub ca_bundle_path: Option<PathBuf>,
    /// End-to-end request budget in milliseconds, including body drain
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    /// System prompt used by one-shot prompt completion
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Default sampling temperature
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Extra request headers
    #[serde(default)]
    pub headers: IndexMap<String, String>,
}
