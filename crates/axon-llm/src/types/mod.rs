//! Canonical types shared by the formatter, parser, and handler
//!
//! These are provider-agnostic; wire shapes live in [`crate::protocol`].

pub mod message;
pub mod request;
pub mod stream;

pub use message::{Content, ContentPart, ConversationTurn, Role};
pub use request::{MessageOptions, RequestSpec};
pub use stream::{ContentFragment, ErrorKind, StreamEvent, UsageSummary};
