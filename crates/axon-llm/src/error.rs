use thiserror::Error;

use crate::types::{ErrorKind, StreamEvent};

/// Errors that can occur while completing a conversation
#[derive(Debug, Error)]
pub enum LlmError {
    /// The conversation cannot be formatted into a request
    #[error("invalid conversation: {0}")]
    Format(String),

    /// Connection, TLS, DNS, or timeout failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx status or an explicit `error` object from the provider
    #[error("{}", protocol_message(*.status, .message))]
    Protocol {
        /// HTTP status, when the error came from the status line
        status: Option<u16>,
        /// Provider's error message
        message: String,
    },

    /// Well-formed response without any extractable content
    #[error("no content in response: {0}")]
    NoContent(String),

    /// A single frame could not be decoded
    #[error("failed to decode frame: {0}")]
    Decode(String),

    /// The client cannot be built from its configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A one-shot completion failed
    #[error("{provider} completion error: {message}")]
    Completion {
        /// Provider that produced the failure
        provider: String,
        /// Kind of the terminal error
        kind: ErrorKind,
        /// Description of the failure
        message: String,
    },
}

fn protocol_message(status: Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("provider returned {status}: {message}"),
        None => format!("provider error: {message}"),
    }
}

impl LlmError {
    /// Kind tag carried by `StreamEvent::Error`
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Format(_) => ErrorKind::Format,
            Self::Transport(_) | Self::Config(_) => ErrorKind::Transport,
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::NoContent(_) => ErrorKind::NoContent,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Completion { kind, .. } => *kind,
        }
    }

    /// Whether the calling loop may reasonably retry the request
    ///
    /// The client itself never retries.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Protocol { status: Some(status), .. } => *status == 429 || *status >= 500,
            Self::Completion { kind, .. } => matches!(kind, ErrorKind::Transport),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Transport(format!("request timed out: {e}"))
        } else if e.is_connect() {
            Self::Transport(format!("connection failed: {e}"))
        } else if e.is_builder() {
            Self::Config(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl From<LlmError> for StreamEvent {
    /// Terminal event for the error; the message is the provider-facing
    /// detail without the category prefix
    fn from(err: LlmError) -> Self {
        let kind = err.kind();
        let message = match err {
            LlmError::Protocol {
                status: Some(status),
                message,
            } => format!("HTTP {status}: {message}"),
            LlmError::Format(message)
            | LlmError::Transport(message)
            | LlmError::Protocol { message, .. }
            | LlmError::NoContent(message)
            | LlmError::Decode(message)
            | LlmError::Config(message)
            | LlmError::Completion { message, .. } => message,
        };
        Self::Error { kind, message }
    }
}
