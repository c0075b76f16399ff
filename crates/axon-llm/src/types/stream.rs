use std::fmt;

use serde::{Deserialize, Serialize};

/// Event handed to the caller while a completion streams
///
/// A sequence is zero or more `Content` events, at most one `Usage`, then
/// exactly one of `Done` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Answer text, in arrival order
    Content(ContentFragment),
    /// Token accounting; the answer is complete
    Usage(UsageSummary),
    /// The completion finished normally
    Done,
    /// The completion failed
    Error {
        /// Failure category
        kind: ErrorKind,
        /// Human-readable description, including the provider's message
        message: String,
    },
}

impl StreamEvent {
    /// Content event from a text fragment
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content(ContentFragment { text: text.into() })
    }

    /// Error event
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Error {
            kind,
            message: message.into(),
        }
    }

    /// Whether this event ends the sequence
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }
}

/// Smallest extractable piece of answer text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFragment {
    /// Fragment text
    pub text: String,
}

/// Token usage of one completion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    /// Tokens consumed by the prompt
    pub input_tokens: u64,
    /// Tokens generated in the answer
    pub output_tokens: u64,
    /// Prompt tokens written to the provider's cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_write_tokens: Option<u64>,
    /// Prompt tokens served from the provider's cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_tokens: Option<u64>,
}

/// Category of a terminal error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad or empty conversation, detected before any I/O
    Format,
    /// Connection, TLS, DNS, or timeout
    Transport,
    /// Non-2xx status or explicit provider error object
    Protocol,
    /// No extractable content after every fallback
    NoContent,
    /// Malformed frame; never terminal
    Decode,
}

impl ErrorKind {
    /// Snake-case name of the kind
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Format => "format",
            Self::Transport => "transport",
            Self::Protocol => "protocol",
            Self::NoContent => "no_content",
            Self::Decode => "decode",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
