//! Reply-language selection.

use crate::models::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    He,
    En,
}

/// Pick the reply language: an explicit hint wins, otherwise the last
/// user message decides by script, defaulting to Hebrew.
pub fn detect_lang(hint: Option<&str>, messages: &[ChatMessage]) -> Lang {
    match hint.map(str::trim) {
        Some("he") => return Lang::He,
        Some("en") => return Lang::En,
        _ => {}
    }

    let last_user = messages.iter().rev().find(|m| m.role == "user");
    match last_user {
        Some(m) if contains_hebrew(&m.content) => Lang::He,
        Some(_) => Lang::En,
        None => Lang::He,
    }
}

fn contains_hebrew(s: &str) -> bool {
    s.chars().any(|c| ('\u{0590}'..='\u{05FF}').contains(&c))
}
