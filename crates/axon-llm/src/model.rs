//! Model metadata catalog with cost estimation
//!
//! Built-in entries cover common models; `[[models]]` config entries layer
//! over them. Lookups never fail: unknown ids get the default entry.

use std::collections::HashMap;

use axon_config::ModelProfileConfig;
use serde::Serialize;

use crate::types::UsageSummary;

/// Static metadata for one model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    /// Context window in tokens
    pub context_window: u32,
    /// Maximum tokens the model will generate
    pub max_output_tokens: u32,
    /// Cost per million input tokens (USD)
    pub input_price: f64,
    /// Cost per million output tokens (USD)
    pub output_price: f64,
    /// Cost per million cache-write tokens (USD), input price when unset
    pub cache_write_price: Option<f64>,
    /// Cost per million cache-read tokens (USD), input price when unset
    pub cache_read_price: Option<f64>,
    /// Whether the provider caches prompt prefixes
    pub supports_prompt_cache: bool,
    /// Whether image content parts are accepted
    pub supports_images: bool,
    /// Whether a sampling temperature is accepted
    pub supports_temperature: bool,
}

impl Default for ModelInfo {
    fn default() -> Self {
        Self {
            context_window: 128_000,
            max_output_tokens: 4_096,
            input_price: 0.0,
            output_price: 0.0,
            cache_write_price: None,
            cache_read_price: None,
            supports_prompt_cache: false,
            supports_images: false,
            supports_temperature: true,
        }
    }
}

impl ModelInfo {
    /// Estimate the cost of a completion in USD
    ///
    /// Cached prompt tokens are billed at their cache price; the remaining
    /// input tokens at the input price.
    #[allow(clippy::cast_precision_loss)]
    pub fn estimate_cost(&self, usage: &UsageSummary) -> f64 {
        let cache_write = usage.cache_write_tokens.unwrap_or(0);
        let cache_read = usage.cache_read_tokens.unwrap_or(0);
        let uncached = usage.input_tokens.saturating_sub(cache_write.saturating_add(cache_read));

        let per_token = |tokens: u64, price: f64| (tokens as f64 / 1_000_000.0) * price;

        per_token(uncached, self.input_price)
            + per_token(cache_write, self.cache_write_price.unwrap_or(self.input_price))
            + per_token(cache_read, self.cache_read_price.unwrap_or(self.input_price))
            + per_token(usage.output_tokens, self.output_price)
    }

    fn apply(&mut self, profile: &ModelProfileConfig) {
        if let Some(context_window) = profile.context_window {
            self.context_window = context_window;
        }
        if let Some(max_output_tokens) = profile.max_output_tokens {
            self.max_output_tokens = max_output_tokens;
        }
        if let Some(input_price) = profile.input_price {
            self.input_price = input_price;
        }
        if let Some(output_price) = profile.output_price {
            self.output_price = output_price;
        }
        if profile.cache_write_price.is_some() {
            self.cache_write_price = profile.cache_write_price;
        }
        if profile.cache_read_price.is_some() {
            self.cache_read_price = profile.cache_read_price;
        }
        if let Some(supports_prompt_cache) = profile.supports_prompt_cache {
            self.supports_prompt_cache = supports_prompt_cache;
        }
        if let Some(supports_images) = profile.supports_images {
            self.supports_images = supports_images;
        }
        if let Some(supports_temperature) = profile.supports_temperature {
            self.supports_temperature = supports_temperature;
        }
    }
}

/// Lookup table from model id to metadata
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    entries: HashMap<String, ModelInfo>,
    fallback: ModelInfo,
}

impl ModelCatalog {
    /// Catalog with the built-in entries only
    pub fn builtin() -> Self {
        let entries = [
            (
                "gpt-4o",
                ModelInfo {
                    context_window: 128_000,
                    max_output_tokens: 16_384,
                    input_price: 2.5,
                    output_price: 10.0,
                    cache_read_price: Some(1.25),
                    supports_prompt_cache: true,
                    supports_images: true,
                    ..ModelInfo::default()
                },
            ),
            (
                "gpt-4o-mini",
                ModelInfo {
                    context_window: 128_000,
                    max_output_tokens: 16_384,
                    input_price: 0.15,
                    output_price: 0.6,
                    cache_read_price: Some(0.075),
                    supports_prompt_cache: true,
                    supports_images: true,
                    ..ModelInfo::default()
                },
            ),
            (
                "o3-mini",
                ModelInfo {
                    context_window: 200_000,
                    max_output_tokens: 100_000,
                    input_price: 1.1,
                    output_price: 4.4,
                    cache_read_price: Some(0.55),
                    supports_prompt_cache: true,
                    supports_temperature: false,
                    ..ModelInfo::default()
                },
            ),
            (
                "deepseek-chat",
                ModelInfo {
                    context_window: 64_000,
                    max_output_tokens: 8_192,
                    input_price: 0.27,
                    output_price: 1.1,
                    cache_write_price: Some(0.27),
                    cache_read_price: Some(0.07),
                    supports_prompt_cache: true,
                    ..ModelInfo::default()
                },
            ),
            (
                "deepseek-reasoner",
                ModelInfo {
                    context_window: 64_000,
                    max_output_tokens: 8_192,
                    input_price: 0.55,
                    output_price: 2.19,
                    cache_write_price: Some(0.55),
                    cache_read_price: Some(0.14),
                    supports_prompt_cache: true,
                    supports_temperature: false,
                    ..ModelInfo::default()
                },
            ),
        ];

        Self {
            entries: entries.into_iter().map(|(id, info)| (id.to_owned(), info)).collect(),
            fallback: ModelInfo::default(),
        }
    }

    /// Layer configured profiles over the current entries
    ///
    /// A profile for an unknown id starts from the default entry.
    #[must_use]
    pub fn with_profiles(mut self, profiles: &[ModelProfileConfig]) -> Self {
        for profile in profiles {
            let fallback = &self.fallback;
            self.entries
                .entry(profile.id.clone())
                .or_insert_with(|| fallback.clone())
                .apply(profile);
        }
        self
    }

    /// Metadata for `id`, or the default entry when unknown
    pub fn lookup(&self, id: &str) -> ModelInfo {
        self.entries.get(id).unwrap_or(&self.fallback).clone()
    }

    /// Whether `id` has its own entry
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Request parameters derived from the model and configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedParams {
    /// Output token limit sent when requested
    pub max_tokens: u32,
    /// Sampling temperature, `None` when unset or unsupported
    pub temperature: Option<f64>,
}

/// The active model with its metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSelection {
    /// Model identifier
    pub id: String,
    /// Catalog metadata
    pub info: ModelInfo,
    /// Derived request parameters
    pub params: DerivedParams,
}
