//! Streaming chat-completion client
//!
//! Formats a conversation for an `OpenAI`-style endpoint, posts it, and turns
//! whatever comes back (an event stream, one JSON document, or a hybrid of
//! both) into one ordered sequence of content, usage, and terminal events.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod convert;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod handler;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod protocol;
pub mod transport;
pub mod types;

pub use diagnostics::{ChannelDiagnostics, DiagnosticsSink, NoopDiagnostics, TracingDiagnostics};
pub use error::LlmError;
pub use handler::CompletionHandler;
pub use model::{DerivedParams, ModelCatalog, ModelInfo, ModelSelection};
pub use normalize::EventStream;
pub use types::{
    Content, ContentFragment, ContentPart, ConversationTurn, ErrorKind, MessageOptions, Role, StreamEvent,
    UsageSummary,
};
