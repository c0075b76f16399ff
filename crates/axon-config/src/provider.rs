use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Known provider presets
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// `OpenAI` chat completions
    #[default]
    Openai,
    /// `DeepSeek` chat and reasoner models
    Deepseek,
    /// `OpenRouter` aggregator
    Openrouter,
    /// Local Ollama server (`OpenAI`-compatible endpoint)
    Ollama,
    /// Local LM Studio server
    Lmstudio,
    /// Any other `OpenAI`-compatible endpoint; requires `base_url`
    OpenaiCompatible,
}

/// Built-in defaults for a provider
#[derive(Debug, Clone, Copy)]
pub struct ProviderPreset {
    /// Default base URL, empty when the caller must supply one
    pub base_url: &'static str,
    /// Path appended to the base URL
    pub endpoint_path: &'static str,
    /// Conversation wire shape
    pub format: MessageFormat,
    /// Whether to request an event stream
    pub stream: bool,
    /// Body field carrying the output token limit
    pub max_tokens_field: MaxTokensField,
}

impl ProviderKind {
    /// All presets, in the order they are documented
    pub const ALL: [Self; 6] = [
        Self::Openai,
        Self::Deepseek,
        Self::Openrouter,
        Self::Ollama,
        Self::Lmstudio,
        Self::OpenaiCompatible,
    ];

    /// Configuration name of the provider
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Deepseek => "deepseek",
            Self::Openrouter => "openrouter",
            Self::Ollama => "ollama",
            Self::Lmstudio => "lmstudio",
            Self::OpenaiCompatible => "openai_compatible",
        }
    }

    /// Built-in defaults for this provider
    pub const fn preset(self) -> ProviderPreset {
        let (base_url, max_tokens_field) = match self {
            Self::Openai => ("https://api.openai.com/v1", MaxTokensField::MaxCompletionTokens),
            Self::Deepseek => ("https://api.deepseek.com/v1", MaxTokensField::MaxTokens),
            Self::Openrouter => ("https://openrouter.ai/api/v1", MaxTokensField::MaxTokens),
            Self::Ollama => ("http://localhost:11434/v1", MaxTokensField::MaxTokens),
            Self::Lmstudio => ("http://localhost:1234/v1", MaxTokensField::MaxTokens),
            Self::OpenaiCompatible => ("", MaxTokensField::MaxTokens),
        };

        ProviderPreset {
            base_url,
            endpoint_path: "/chat/completions",
            format: MessageFormat::Plain,
            stream: true,
            max_tokens_field,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown provider `{s}`"))
    }
}

/// Wire shape of the outbound conversation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageFormat {
    /// Leading `system` message, history copied as-is
    #[default]
    Plain,
    /// Leading `developer` message, history copied as-is
    Developer,
    /// System prompt folded into the first user turn, same-role runs merged
    R1,
    /// Plain, with content parts flattened to text
    Simple,
}

/// Request body field carrying the output token limit
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxTokensField {
    /// `max_tokens`
    #[default]
    MaxTokens,
    /// `max_completion_tokens`
    MaxCompletionTokens,
}

/// Provider-specific override; every field beats the generic `[client]` value
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderOverride {
    /// Base URL
    #[serde(default)]
    pub base_url: Option<Url>,
    /// API key
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Path appended to the base URL; empty posts to the base URL itself
    #[serde(default)]
    pub endpoint_path: Option<String>,
    /// Conversation wire shape
    #[serde(default)]
    pub format: Option<MessageFormat>,
    /// Whether to request an event stream
    #[serde(default)]
    pub stream: Option<bool>,
    /// Body field carrying the output token limit
    #[serde(default)]
    pub max_tokens_field: Option<MaxTokensField>,
    /// Extra request headers, merged over `[client].headers`
    #[serde(default)]
    pub headers: IndexMap<String, String>,
}

/// Format and streaming defaults implied by the model id
///
/// R1-style reasoners have no system role and are never streamed; `o`-series
/// reasoning models take the system prompt as a `developer` message.
pub fn model_defaults(model: &str) -> (Option<MessageFormat>, Option<bool>) {
    let model = model.to_ascii_lowercase();
    let name = model.rsplit('/').next().unwrap_or(&model);

    if name.contains("reasoner") || name.contains("-r1") || name.starts_with("r1") {
        return (Some(MessageFormat::R1), Some(false));
    }

    if ["o1", "o3", "o4"].iter().any(|prefix| name.starts_with(prefix)) {
        return (Some(MessageFormat::Developer), None);
    }

    (None, None)
}
