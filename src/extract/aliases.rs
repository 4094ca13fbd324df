//! Static payer alias tables and token-boundary matching.
//!
//! Alias lookups are deliberately token-aware rather than raw substring
//! containment: a short alias must match a whole token of the text, so
//! e.g. "maccabiah" never matches the payer "maccabi".

use crate::models::Payer;

/// Known payer name variants, native and transliterated.
const PAYER_ALIASES: &[(&str, Payer)] = &[
    ("מכבי", Payer::Maccabi),
    ("maccabi", Payer::Maccabi),
    ("מאוחדת", Payer::Meuhedet),
    ("meuhedet", Payer::Meuhedet),
    ("כללית", Payer::Clalit),
    ("clalit", Payer::Clalit),
];

/// Find a payer alias appearing as a whole token in `text`
/// (case-insensitive). Returns the first payer whose alias matches.
pub fn payer_from_text(text: &str) -> Option<Payer> {
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = tokenize(&lower).collect();
    for (alias, payer) in PAYER_ALIASES {
        if tokens.iter().any(|t| t == alias) {
            return Some(*payer);
        }
    }
    None
}

/// Split on anything that is not alphanumeric. Hebrew letters are
/// alphabetic, so mixed-script text tokenizes uniformly.
pub fn tokenize(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
}
