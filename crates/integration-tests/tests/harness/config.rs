//! Programmatic configuration builder for integration tests

use std::sync::Arc;

use axon_config::{ClientConfig, Config, MessageFormat, ProviderKind, ProviderOverride};
use axon_llm::{CompletionHandler, ModelCatalog, NoopDiagnostics};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Generic OpenAI-compatible client pointed at `base_url`
    pub fn new(base_url: &str) -> Self {
        Self {
            config: Config {
                client: ClientConfig {
                    provider: ProviderKind::OpenaiCompatible,
                    model: "mock-model-1".to_owned(),
                    api_key: Some(SecretString::from("test-key")),
                    base_url: Some(base_url.parse().expect("valid URL")),
                    ..ClientConfig::default()
                },
                ..Config::default()
            },
        }
    }

    /// Set the model id
    pub fn with_model(mut self, model: &str) -> Self {
        self.config.client.model = model.to_owned();
        self
    }

    /// Set the end-to-end request timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.client.request_timeout_ms = Some(timeout_ms);
        self
    }

    /// Set the system prompt used by prompt completion
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.config.client.system_prompt = Some(prompt.to_owned());
        self
    }

    /// Override the message format for the provider
    pub fn with_format(mut self, format: MessageFormat) -> Self {
        self.provider_override().format = Some(format);
        self
    }

    /// Override whether the provider is asked to stream
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.provider_override().stream = Some(stream);
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config.validate().expect("valid test config");
        self.config
    }

    /// Build a handler with diagnostics discarded
    pub fn handler(self) -> CompletionHandler {
        let config = self.build();
        let catalog = ModelCatalog::builtin().with_profiles(&config.models);
        CompletionHandler::new(config.resolve().expect("resolvable config"), &catalog)
            .expect("valid handler")
            .with_diagnostics(Arc::new(NoopDiagnostics))
    }

    fn provider_override(&mut self) -> &mut ProviderOverride {
        self.config
            .providers
            .entry(ProviderKind::OpenaiCompatible.as_str().to_owned())
            .or_default()
    }
}
