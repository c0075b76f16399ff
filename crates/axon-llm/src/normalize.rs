//! Turning parsed frames into the caller-facing event sequence
//!
//! Content is forwarded as soon as a frame yields it. Usage is held back
//! until the answer is complete, so a `Usage` event always follows every
//! `Content` event it accounts for. Exactly one of `Done` or `Error` ends
//! every sequence.

use std::pin::Pin;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use serde_json::Value;

use crate::diagnostics::DiagnosticsSink;
use crate::error::LlmError;
use crate::extract::{extract_content, extract_error, extract_usage};
use crate::parser::{FrameParser, RawFrame};
use crate::transport::TransportResponse;
use crate::types::{StreamEvent, UsageSummary};

/// Lazy, finite, non-restartable sequence of events for one request
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Cap on how much of an error body is read
const ERROR_BODY_LIMIT: usize = 64 * 1024;

/// Per-request state between the parser and the caller
pub struct Normalizer {
    diagnostics: Arc<dyn DiagnosticsSink>,
    fragments: usize,
    usage: Option<UsageSummary>,
    fallback_attempts: usize,
    finished: bool,
}

impl Normalizer {
    /// Create a normalizer reporting to `diagnostics`
    pub fn new(diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            diagnostics,
            fragments: 0,
            usage: None,
            fallback_attempts: 0,
            finished: false,
        }
    }

    /// Decode one `data:` payload
    ///
    /// Returns a content event, a terminal protocol error when the frame
    /// carries an `error` member, or nothing. Malformed payloads are
    /// reported to diagnostics and skipped.
    pub fn accept(&mut self, payload: &str) -> Option<StreamEvent> {
        if self.finished {
            return None;
        }

        let frame: Value = match serde_json::from_str(payload) {
            Ok(frame) => frame,
            Err(e) => {
                let err = LlmError::Decode(e.to_string());
                tracing::debug!(error = %err, "skipping malformed frame");
                self.diagnostics.append_line(&format!("skipped frame: {err}: {payload}"));
                return None;
            }
        };

        if let Some(message) = extract_error(&frame) {
            return self.fail(LlmError::Protocol { status: None, message }).pop();
        }

        if let Some(usage) = extract_usage(&frame) {
            self.usage = Some(usage);
        }

        let text = extract_content(&frame)?;
        self.fragments += 1;
        Some(StreamEvent::content(text))
    }

    /// End the sequence once the body is drained or the sentinel is seen
    ///
    /// When line-wise parsing produced no content, `raw` is parsed once as a
    /// whole JSON document. An empty answer is never a success.
    pub fn finish(&mut self, raw: &str) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }

        if self.fragments > 0 {
            self.finished = true;
            return self.usage.take().map(StreamEvent::Usage).into_iter().chain([StreamEvent::Done]).collect();
        }

        self.fallback_attempts += 1;
        self.diagnostics
            .append_line(&format!("no streamed content, parsing {} byte body as one document", raw.len()));

        let Ok(document) = serde_json::from_str::<Value>(raw.trim()) else {
            return self.fail(LlmError::NoContent("response body held no content frames".to_owned()));
        };

        if let Some(message) = extract_error(&document) {
            return self.fail(LlmError::Protocol { status: None, message });
        }

        let Some(text) = extract_content(&document) else {
            return self.fail(LlmError::NoContent("response document held no content".to_owned()));
        };

        self.finished = true;
        self.fragments += 1;

        let usage = extract_usage(&document).or_else(|| self.usage.take());
        [StreamEvent::content(text)]
            .into_iter()
            .chain(usage.map(StreamEvent::Usage))
            .chain([StreamEvent::Done])
            .collect()
    }

    /// End the sequence with an error, unless it already ended
    pub fn fail(&mut self, err: LlmError) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }

        self.finished = true;
        self.diagnostics.append_line(&format!("request failed: {err}"));
        vec![err.into()]
    }

    /// Whether any content fragment has been produced
    pub const fn has_content(&self) -> bool {
        self.fragments > 0
    }

    /// Whether a terminal event has been produced
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of times the whole-document fallback ran
    pub const fn fallback_attempts(&self) -> usize {
        self.fallback_attempts
    }
}

/// Parser and normalizer driven together by body chunks
pub struct ResponseDecoder {
    parser: FrameParser,
    normalizer: Normalizer,
}

impl ResponseDecoder {
    /// Create a decoder for one response
    pub fn new(diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            parser: FrameParser::new(),
            normalizer: Normalizer::new(diagnostics),
        }
    }

    /// Feed one body chunk
    pub fn on_chunk(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        let frames = self.parser.feed(chunk);
        self.drive(frames)
    }

    /// Whether more body is needed to reach a terminal event
    pub const fn wants_more(&self) -> bool {
        !self.parser.is_done() && !self.normalizer.is_finished()
    }

    /// The body ended: flush the trailing segment and finish
    pub fn on_end(&mut self) -> Vec<StreamEvent> {
        let frames = self.parser.flush();
        let mut events = self.drive(frames);
        events.extend(self.normalizer.finish(&self.parser.raw_text()));
        events
    }

    /// Reading the body failed
    ///
    /// Whatever is still buffered is released without being forwarded.
    pub fn on_error(&mut self, err: LlmError) -> Vec<StreamEvent> {
        let discarded = self.parser.flush();
        if !discarded.is_empty() {
            tracing::debug!(frames = discarded.len(), "discarding buffered frames after body error");
        }
        self.normalizer.fail(err)
    }

    /// End with an error before any body was read
    pub fn fail(&mut self, err: LlmError) -> Vec<StreamEvent> {
        self.normalizer.fail(err)
    }

    /// Number of times the whole-document fallback ran
    pub const fn fallback_attempts(&self) -> usize {
        self.normalizer.fallback_attempts()
    }

    fn drive(&mut self, frames: Vec<RawFrame>) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        for frame in frames {
            match frame {
                RawFrame::Data(payload) => {
                    events.extend(self.normalizer.accept(&payload));
                    // the whole-document fallback can no longer run
                    if self.normalizer.has_content() {
                        self.parser.release_raw();
                    }
                }
                RawFrame::Done => events.extend(self.normalizer.finish(&self.parser.raw_text())),
            }

            if self.normalizer.is_finished() {
                break;
            }
        }

        events
    }
}

/// Event sequence for a response
///
/// The body is read only while the caller polls, one chunk at a time.
/// Dropping the stream drops the body and closes the connection.
pub fn event_stream(response: TransportResponse, diagnostics: Arc<dyn DiagnosticsSink>) -> EventStream {
    Box::pin(async_stream::stream! {
        let TransportResponse { status, mut body, .. } = response;
        let mut decoder = ResponseDecoder::new(diagnostics);

        if !status.is_success() {
            let message = read_error_body(&mut body, status).await;
            tracing::warn!(status = %status, "provider returned error status");
            for event in decoder.fail(LlmError::Protocol { status: Some(status.as_u16()), message }) {
                yield event;
            }
            return;
        }

        while decoder.wants_more() {
            match body.next().await {
                Some(Ok(chunk)) => {
                    for event in decoder.on_chunk(&chunk) {
                        yield event;
                    }
                }
                Some(Err(err)) => {
                    for event in decoder.on_error(err) {
                        yield event;
                    }
                    return;
                }
                None => break,
            }
        }

        for event in decoder.on_end() {
            yield event;
        }
    })
}

/// Provider's message from a non-2xx body
async fn read_error_body(
    body: &mut (impl Stream<Item = Result<bytes::Bytes, LlmError>> + Unpin),
    status: http::StatusCode,
) -> String {
    let mut raw = Vec::new();
    while raw.len() < ERROR_BODY_LIMIT {
        match body.next().await {
            Some(Ok(chunk)) => raw.extend_from_slice(&chunk),
            Some(Err(err)) => {
                tracing::debug!(status = %status, error = %err, "error body cut short");
                break;
            }
            None => break,
        }
    }
    raw.truncate(ERROR_BODY_LIMIT);

    let text = String::from_utf8_lossy(&raw);
    let message = serde_json::from_str::<Value>(text.trim())
        .ok()
        .and_then(|document| extract_error(&document))
        .unwrap_or_else(|| text.trim().to_owned());

    if message.is_empty() {
        status.canonical_reason().unwrap_or("no error body").to_owned()
    } else {
        message
    }
}
