//! Conversion of a conversation into the wire message array a provider expects
//!
//! Pure functions: no I/O, no state, deterministic for a given input.

mod r1;

pub use axon_config::MessageFormat;

use crate::error::LlmError;
use crate::protocol::openai::{WireContent, WireContentPart, WireImageUrl, WireMessage};
use crate::types::{Content, ContentPart, ConversationTurn, Role};

/// Format a system prompt and turn history into wire messages
///
/// An empty history is replaced by a single user turn holding
/// `fallback_prompt`. Fails before any I/O when there is nothing to send or
/// no turn carries user content.
pub fn format_messages(
    system_prompt: &str,
    history: &[ConversationTurn],
    fallback_prompt: Option<&str>,
    format: MessageFormat,
) -> Result<Vec<WireMessage>, LlmError> {
    let fallback;
    let turns = if history.is_empty() {
        let Some(prompt) = fallback_prompt else {
            return Err(LlmError::Format(
                "conversation history is empty and no prompt was supplied".to_owned(),
            ));
        };
        fallback = [ConversationTurn::user(prompt)];
        &fallback[..]
    } else {
        history
    };

    if !turns.iter().any(|turn| turn.role == Role::User) {
        return Err(LlmError::Format("conversation has no user turn".to_owned()));
    }

    let messages = match format {
        MessageFormat::Plain => with_leading(Role::System, system_prompt, turns, wire_content),
        MessageFormat::Developer => with_leading(Role::Developer, system_prompt, turns, wire_content),
        MessageFormat::Simple => with_leading(Role::System, system_prompt, turns, |content| {
            WireContent::Text(content.flatten_text("\n"))
        }),
        MessageFormat::R1 => r1::format(system_prompt, turns),
    };

    Ok(messages)
}

fn with_leading(
    leading: Role,
    system_prompt: &str,
    turns: &[ConversationTurn],
    content: impl Fn(&Content) -> WireContent,
) -> Vec<WireMessage> {
    let prompt = (!system_prompt.is_empty()).then(|| WireMessage::text(leading.as_str(), system_prompt));

    prompt
        .into_iter()
        .chain(turns.iter().map(|turn| WireMessage {
            role: turn.role.as_str().to_owned(),
            content: content(&turn.content),
        }))
        .collect()
}

/// Project canonical content onto the wire, keeping structure
fn wire_content(content: &Content) -> WireContent {
    match content {
        Content::Text(text) => WireContent::Text(text.clone()),
        Content::Parts(parts) => WireContent::Parts(parts.iter().map(Into::into).collect()),
    }
}

impl From<&ContentPart> for WireContentPart {
    fn from(part: &ContentPart) -> Self {
        match part {
            ContentPart::Text { text } => Self::Text { text: text.clone() },
            ContentPart::Image { url, detail } => Self::ImageUrl {
                image_url: WireImageUrl {
                    url: url.clone(),
                    detail: detail.clone(),
                },
            },
        }
    }
}
