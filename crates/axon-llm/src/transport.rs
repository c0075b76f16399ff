//! HTTP transport: one POST per request, body exposed as a lazy byte stream

use std::fmt;
use std::path::Path;

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, StatusCode};
use reqwest::{Certificate, Client};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::LlmError;
use crate::types::RequestSpec;

/// Status, headers, and not-yet-read body of a response
pub struct TransportResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Body chunks, pulled on demand; dropping it closes the connection
    pub body: BoxStream<'static, Result<Bytes, LlmError>>,
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Shared HTTP clients plus the credential injected into each request
///
/// Trust material is loaded once at construction. Cloning is cheap and
/// requests never mutate it.
#[derive(Clone)]
pub struct Transport {
    plain: Client,
    /// Client trusting the configured CA bundle, used for https only
    tls: Option<Client>,
    api_key: Option<SecretString>,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("custom_trust", &self.tls.is_some())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Transport {
    /// Build the transport
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Config` if the CA bundle cannot be read or holds
    /// no usable certificate, or a client cannot be built
    pub fn new(api_key: Option<SecretString>, ca_bundle_path: Option<&Path>) -> Result<Self, LlmError> {
        let plain = Client::builder().build().map_err(|e| LlmError::Config(e.to_string()))?;

        let tls = ca_bundle_path.map(load_trusting_client).transpose()?;

        Ok(Self { plain, tls, api_key })
    }

    /// Post the request and return once the status line and headers arrive
    ///
    /// The timeout in `spec` covers the whole exchange, body included.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Transport` on connection failure, DNS failure, or
    /// timeout, and `LlmError::Config` if a header cannot be encoded
    pub async fn send(&self, spec: RequestSpec) -> Result<TransportResponse, LlmError> {
        let streaming = spec.body.stream.unwrap_or(false);
        let headers = self.assemble_headers(spec.headers, streaming)?;

        let response = self
            .client_for(&spec.endpoint)
            .post(spec.endpoint.clone())
            .headers(headers)
            .json(&spec.body)
            .timeout(spec.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(endpoint = %spec.endpoint, error = %e, "request failed");
                LlmError::from(e)
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        tracing::debug!(endpoint = %spec.endpoint, status = %status, "response headers received");

        let body = response.bytes_stream().map(|chunk| chunk.map_err(LlmError::from)).boxed();

        Ok(TransportResponse { status, headers, body })
    }

    fn client_for(&self, endpoint: &Url) -> &Client {
        match (&self.tls, endpoint.scheme()) {
            (Some(tls), "https") => tls,
            _ => &self.plain,
        }
    }

    fn assemble_headers(&self, mut headers: HeaderMap, streaming: bool) -> Result<HeaderMap, LlmError> {
        if !headers.contains_key(AUTHORIZATION)
            && let Some(key) = &self.api_key
        {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", key.expose_secret()))
                .map_err(|e| LlmError::Config(format!("api key is not a valid header value: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if streaming && !headers.contains_key(ACCEPT) {
            headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        }

        Ok(headers)
    }
}

fn load_trusting_client(path: &Path) -> Result<Client, LlmError> {
    let pem = std::fs::read(path)
        .map_err(|e| LlmError::Config(format!("failed to read CA bundle {}: {e}", path.display())))?;

    let certificates = Certificate::from_pem_bundle(&pem)
        .map_err(|e| LlmError::Config(format!("invalid CA bundle {}: {e}", path.display())))?;
    if certificates.is_empty() {
        return Err(LlmError::Config(format!(
            "CA bundle {} contains no certificates",
            path.display()
        )));
    }

    tracing::debug!(path = %path.display(), count = certificates.len(), "loaded CA bundle");

    certificates
        .into_iter()
        .fold(Client::builder(), reqwest::ClientBuilder::add_root_certificate)
        .build()
        .map_err(|e| LlmError::Config(e.to_string()))
}
