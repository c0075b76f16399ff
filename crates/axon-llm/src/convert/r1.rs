//! R1 formatting for chat templates without a system role
//!
//! The system prompt becomes a leading user turn, system/developer turns are
//! demoted to user, and runs of same-role turns are merged because the
//! target API rejects back-to-back turns with the same role.

use super::wire_content;
use crate::protocol::openai::WireMessage;
use crate::types::{Content, ConversationTurn, Role};

/// Content of the user turn inserted when the merged history opens with the assistant
pub const PLACEHOLDER_USER_CONTENT: &str = ".";

pub(super) fn format(system_prompt: &str, turns: &[ConversationTurn]) -> Vec<WireMessage> {
    let leading = (!system_prompt.is_empty()).then(|| ConversationTurn::user(system_prompt));

    let mut merged: Vec<(Role, Content)> = Vec::with_capacity(turns.len() + 1);
    for turn in leading.iter().chain(turns) {
        let role = match turn.role {
            Role::Assistant => Role::Assistant,
            Role::User | Role::System | Role::Developer => Role::User,
        };

        match merged.last_mut() {
            Some((last_role, content)) if *last_role == role => append(content, turn.content.clone()),
            _ => merged.push((role, turn.content.clone())),
        }
    }

    if merged.first().is_none_or(|(role, _)| *role != Role::User) {
        merged.insert(0, (Role::User, Content::Text(PLACEHOLDER_USER_CONTENT.to_owned())));
    }

    merged
        .into_iter()
        .map(|(role, content)| WireMessage {
            role: role.as_str().to_owned(),
            content: wire_content(&content),
        })
        .collect()
}

/// Merge `next` into `target`: text joins with a newline, anything else
/// concatenates part lists
fn append(target: &mut Content, next: Content) {
    match (target, next) {
        (Content::Text(text), Content::Text(next)) => {
            text.push('\n');
            text.push_str(&next);
        }
        (target, next) => {
            let mut parts = std::mem::replace(target, Content::Parts(Vec::new())).into_parts();
            parts.extend(next.into_parts());
            *target = Content::Parts(parts);
        }
    }
}
