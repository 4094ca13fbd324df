//! Tier-segment explosion: split a benefit cell into per-tier chunks.
//!
//! Cells often pack all tiers into one blob:
//! `"זהב: 80% הנחה כסף: 60% הנחה ארד: 40% הנחה"`.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::models::Tier;

/// One tier-labelled slice of a benefit cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierSegment {
    pub tier: Tier,
    pub text: String,
}

/// Any known tier label (native or transliterated) followed by a colon.
static TIER_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(זהב|gold|כסף|silver|ארד|bronze)\s*:\s*").expect("tier label regex")
});

/// Collapse runs of whitespace and trim.
pub fn clean_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split `text` into tier segments.
///
/// Text before the first label is dropped when labels exist; when no
/// label is found the whole cell becomes a single untiered segment.
/// Segments are deduplicated by (tier, text) within the cell.
pub fn explode_tiers(text: &str) -> Vec<TierSegment> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let matches: Vec<_> = TIER_LABEL_RE.find_iter(text).collect();
    if matches.is_empty() {
        return vec![TierSegment {
            tier: Tier::Unknown,
            text: clean_text(text),
        }];
    }

    let mut segments = Vec::new();
    let mut seen: HashSet<(Tier, String)> = HashSet::new();

    for (i, m) in matches.iter().enumerate() {
        let start = m.end();
        let end = matches.get(i + 1).map_or(text.len(), |next| next.start());
        let body = clean_text(&text[start..end]);
        if body.is_empty() {
            continue;
        }
        // The label token sits just before the colon.
        let label = m.as_str().trim_end_matches([':', ' ', '\t', '\n']).trim();
        let tier = Tier::parse(label).unwrap_or(Tier::Unknown);
        if seen.insert((tier, body.clone())) {
            segments.push(TierSegment { tier, text: body });
        }
    }

    if segments.is_empty() {
        return vec![TierSegment {
            tier: Tier::Unknown,
            text: clean_text(text),
        }];
    }
    segments
}
