//! Configuration for the axon completion client
//!
//! Loaded from TOML with `{{ env.VAR }}` expansion, validated, then resolved
//! once into an immutable [`ResolvedClient`] that the client is built from.

#![allow(clippy::must_use_candidate)]

pub mod client;
mod env;
mod loader;
pub mod models;
pub mod provider;
mod resolve;
pub mod telemetry;

use indexmap::IndexMap;
use serde::Deserialize;

pub use client::*;
pub use models::*;
pub use provider::*;
pub use resolve::{DEFAULT_REQUEST_TIMEOUT, ResolvedClient};
pub use telemetry::*;

/// Top-level axon configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Generic client settings
    #[serde(default)]
    pub client: ClientConfig,
    /// Provider-specific overrides keyed by provider name
    #[serde(default)]
    pub providers: IndexMap<String, ProviderOverride>,
    /// Model metadata additions and overrides
    #[serde(default)]
    pub models: Vec<ModelProfileConfig>,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
