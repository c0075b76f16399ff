//! Completion handler binding formatter, transport, and normalizer

use std::sync::Arc;

use axon_config::{MaxTokensField, ResolvedClient};
use futures_util::{StreamExt, stream};
use http::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::convert::format_messages;
use crate::diagnostics::{DiagnosticsSink, TracingDiagnostics};
use crate::error::LlmError;
use crate::model::{DerivedParams, ModelCatalog, ModelInfo, ModelSelection};
use crate::normalize::{EventStream, event_stream};
use crate::protocol::openai::{ChatRequestBody, StreamOptions};
use crate::transport::Transport;
use crate::types::{ConversationTurn, MessageOptions, RequestSpec, StreamEvent};

/// Whether the endpoint is the canonical `OpenAI` API (vs a compatible third-party)
fn is_canonical_openai(endpoint: &Url) -> bool {
    endpoint.host_str().is_some_and(|h| h == "api.openai.com")
}

/// Streaming chat-completion client for one resolved provider
///
/// Holds only read-only state; concurrent calls share nothing mutable and
/// each gets its own connection, parser, and normalizer.
pub struct CompletionHandler {
    config: ResolvedClient,
    info: ModelInfo,
    headers: HeaderMap,
    transport: Transport,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl CompletionHandler {
    /// Build a handler from resolved configuration
    ///
    /// Diagnostics go to `tracing` until replaced with
    /// [`with_diagnostics`](Self::with_diagnostics).
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Config` if a header is invalid or the CA bundle
    /// cannot be loaded
    pub fn new(config: ResolvedClient, catalog: &ModelCatalog) -> Result<Self, LlmError> {
        let headers = header_map(&config)?;
        let transport = Transport::new(config.api_key.clone(), config.ca_bundle_path.as_deref())?;
        let info = catalog.lookup(&config.model);

        if !catalog.contains(&config.model) {
            tracing::debug!(model = %config.model, "model not in catalog, using default metadata");
        }

        Ok(Self {
            config,
            info,
            headers,
            transport,
            diagnostics: Arc::new(TracingDiagnostics),
        })
    }

    /// Replace the diagnostics sink
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Provider this handler talks to
    pub const fn config(&self) -> &ResolvedClient {
        &self.config
    }

    /// Stream a completion of `history`
    ///
    /// Nothing is sent until the returned stream is polled. A conversation
    /// that cannot be formatted yields a single `Error` event without any
    /// network I/O.
    pub fn create_message(
        &self,
        system_prompt: &str,
        history: &[ConversationTurn],
        options: &MessageOptions,
    ) -> EventStream {
        self.start(system_prompt, history, None, options)
    }

    /// Complete a single prompt and return the whole answer
    ///
    /// Uses the configured system prompt.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Completion` naming the provider for the first
    /// terminal error of the underlying stream
    pub async fn complete_prompt(&self, prompt: &str) -> Result<String, LlmError> {
        let mut events = self.start(&self.config.system_prompt, &[], Some(prompt), &MessageOptions::default());
        let mut answer = String::new();

        while let Some(event) = events.next().await {
            match event {
                StreamEvent::Content(fragment) => answer.push_str(&fragment.text),
                StreamEvent::Error { kind, message } => {
                    return Err(LlmError::Completion {
                        provider: self.config.provider.to_string(),
                        kind,
                        message,
                    });
                }
                StreamEvent::Usage(_) | StreamEvent::Done => {}
            }
        }

        Ok(answer)
    }

    /// The active model, its metadata, and derived request parameters
    pub fn get_model(&self) -> ModelSelection {
        ModelSelection {
            id: self.config.model.clone(),
            info: self.info.clone(),
            params: DerivedParams {
                max_tokens: self.info.max_output_tokens,
                temperature: self.temperature(None),
            },
        }
    }

    /// Assemble the request for a conversation without sending it
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Format` if the conversation cannot be formatted
    pub fn build_request(
        &self,
        system_prompt: &str,
        history: &[ConversationTurn],
        fallback_prompt: Option<&str>,
        options: &MessageOptions,
    ) -> Result<RequestSpec, LlmError> {
        let messages = format_messages(system_prompt, history, fallback_prompt, self.config.format)?;

        let stream = self.config.stream;

        // Only send stream_options to canonical OpenAI, many compatible
        // APIs reject the unsupported parameter
        let stream_options =
            (stream && is_canonical_openai(&self.config.endpoint)).then_some(StreamOptions { include_usage: true });

        let limit = options
            .include_max_tokens
            .then(|| options.max_tokens.unwrap_or(self.info.max_output_tokens));
        let (max_tokens, max_completion_tokens) = match self.config.max_tokens_field {
            MaxTokensField::MaxTokens => (limit, None),
            MaxTokensField::MaxCompletionTokens => (None, limit),
        };

        let body = ChatRequestBody {
            model: self.config.model.clone(),
            messages,
            stream: Some(stream),
            stream_options,
            temperature: self.temperature(options.temperature),
            max_tokens,
            max_completion_tokens,
        };

        Ok(RequestSpec {
            endpoint: self.config.endpoint.clone(),
            headers: self.headers.clone(),
            body,
            timeout: self.config.request_timeout,
        })
    }

    fn start(
        &self,
        system_prompt: &str,
        history: &[ConversationTurn],
        fallback_prompt: Option<&str>,
        options: &MessageOptions,
    ) -> EventStream {
        let spec = match self.build_request(system_prompt, history, fallback_prompt, options) {
            Ok(spec) => spec,
            Err(err) => {
                tracing::warn!(provider = %self.config.provider, error = %err, "conversation rejected");
                self.diagnostics.append_line(&format!("request failed: {err}"));
                return Box::pin(stream::iter([StreamEvent::from(err)]));
            }
        };

        tracing::debug!(
            provider = %self.config.provider,
            model = %spec.body.model,
            messages = spec.body.messages.len(),
            stream = self.config.stream,
            "sending completion request"
        );

        let transport = self.transport.clone();
        let diagnostics = Arc::clone(&self.diagnostics);

        Box::pin(async_stream::stream! {
            let response = match transport.send(spec).await {
                Ok(response) => response,
                Err(err) => {
                    diagnostics.append_line(&format!("request failed: {err}"));
                    yield StreamEvent::from(err);
                    return;
                }
            };

            let mut events = event_stream(response, diagnostics);
            while let Some(event) = events.next().await {
                yield event;
            }
        })
    }

    /// Per-call override, then configured default; dropped for models that
    /// reject a temperature
    fn temperature(&self, requested: Option<f64>) -> Option<f64> {
        requested
            .or(self.config.temperature)
            .filter(|_| self.info.supports_temperature)
    }
}

fn header_map(config: &ResolvedClient) -> Result<HeaderMap, LlmError> {
    let mut headers = HeaderMap::with_capacity(config.headers.len());

    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| LlmError::Config(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| LlmError::Config(format!("invalid value for header '{name}': {e}")))?;
        headers.insert(name, value);
    }

    Ok(headers)
}
