use serde::Deserialize;

/// Model metadata entry layered over the built-in catalog
///
/// Unset fields inherit from the built-in entry for the same id, or from the
/// catalog's default entry when the id is unknown.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelProfileConfig {
    /// Model identifier
    pub id: String,
    /// Context window in tokens
    #[serde(default)]
    pub context_window: Option<u32>,
    /// Maximum tokens the model will generate
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    /// Cost per million input tokens (USD)
    #[serde(default)]
    pub input_price: Option<f64>,
    /// Cost per million output tokens (USD)
    #[serde(default)]
    pub output_price: Option<f64>,
    /// Cost per million cache-write tokens (USD)
    #[serde(default)]
    pub cache_write_price: Option<f64>,
    /// Cost per million cache-read tokens (USD)
    #[serde(default)]
    pub cache_read_price: Option<f64>,
    /// Whether the model supports prompt caching
    #[serde(default)]
    pub supports_prompt_cache: Option<bool>,
    /// Whether the model accepts image content parts
    #[serde(default)]
    pub supports_images: Option<bool>,
    /// Whether the model accepts a sampling temperature
    #[serde(default)]
    pub supports_temperature: Option<bool>,
}
