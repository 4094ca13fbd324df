//! The two-phase chat flow: profile collection, then grounded QA.

pub mod collect;
pub mod lang;
pub mod prompts;
pub mod qa;
pub mod validators;

use crate::models::ChatMessage;

const MAX_HISTORY_TURNS: usize = 10;
const MAX_MESSAGE_CHARS: usize = 2000;

/// Sanitize client-supplied history before forwarding it upstream:
/// only user/assistant roles survive (no client-injected system
/// prompts), only the last `MAX_HISTORY_TURNS` turns are kept, and each
/// message is capped at `MAX_MESSAGE_CHARS`.
pub fn sanitize_history(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    let filtered: Vec<&ChatMessage> = messages
        .iter()
        .filter(|m| m.role == "user" || m.role == "assistant")
        .collect();

    let start = filtered.len().saturating_sub(MAX_HISTORY_TURNS);
    filtered[start..]
        .iter()
        .map(|m| ChatMessage {
            role: m.role.clone(),
            content: truncate_chars(&m.content, MAX_MESSAGE_CHARS).to_string(),
        })
        .collect()
}

/// Last user message in a sanitized history, if any.
pub fn last_user_message(messages: &[ChatMessage]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .map(|m| m.content.as_str())
}

/// Truncate to at most `max` bytes on a UTF-8 char boundary.
fn truncate_chars(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
