//! Wire format types for the chat-completion protocol
//!
//! Pure serde structs matching the JSON the endpoint accepts. Responses are
//! probed as untyped JSON instead, see [`crate::extract`].

pub mod openai;
