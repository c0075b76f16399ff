use std::time::Duration;

use http::HeaderMap;
use url::Url;

use crate::protocol::openai::ChatRequestBody;

/// Per-call knobs for `create_message`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageOptions {
    /// Send an output token limit in the request body
    pub include_max_tokens: bool,
    /// Explicit limit; the model's maximum is used when unset
    pub max_tokens: Option<u32>,
    /// Sampling temperature overriding the configured default
    pub temperature: Option<f64>,
}

/// One fully assembled HTTP request
///
/// Built once per call and consumed by the transport; never mutated after.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    /// URL the request is posted to
    pub endpoint: Url,
    /// Extra headers; `HeaderMap` keys are case-insensitive
    pub headers: HeaderMap,
    /// JSON body
    pub body: ChatRequestBody,
    /// End-to-end budget, including body drain
    pub timeout: Duration,
}
