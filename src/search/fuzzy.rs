//! Weighted-ratio fuzzy string similarity on a 0–100 scale.
//!
//! Combines three views of the pair so the score is robust to word
//! order and partial overlaps: plain Levenshtein ratio, token-sorted
//! ratio, and a best-window partial ratio (discounted, since a short
//! needle matching inside a long haystack is weaker evidence).

/// Similarity score in [0, 100], best of plain, token-sorted, and
/// partial window comparisons. Case-insensitive.
pub fn weighted_ratio(a: &str, b: &str) -> f32 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let plain = ratio(&a, &b);
    let sorted = ratio(&sort_tokens(&a), &sort_tokens(&b));
    let partial = 0.9 * partial_ratio(&a, &b);

    plain.max(sorted).max(partial)
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Levenshtein similarity ratio scaled to [0, 100].
pub fn ratio(a: &str, b: &str) -> f32 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 100.0;
    }
    let dist = levenshtein(a, b);
    100.0 * (1.0 - dist as f32 / max_len as f32)
}

/// Best `ratio` of the shorter string against every same-length window
/// of the longer one.
fn partial_ratio(a: &str, b: &str) -> f32 {
    let (short, long): (Vec<char>, Vec<char>) = {
        let ac: Vec<char> = a.chars().collect();
        let bc: Vec<char> = b.chars().collect();
        if ac.len() <= bc.len() {
            (ac, bc)
        } else {
            (bc, ac)
        }
    };
    if short.is_empty() {
        return 0.0;
    }
    if short.len() == long.len() {
        let s: String = short.iter().collect();
        let l: String = long.iter().collect();
        return ratio(&s, &l);
    }

    let needle: String = short.iter().collect();
    let mut best = 0.0f32;
    for window in long.windows(short.len()) {
        let hay: String = window.iter().collect();
        best = best.max(ratio(&needle, &hay));
        if best >= 100.0 {
            break;
        }
    }
    best
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());
    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    // Two-row DP.
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut cur = vec![0usize; n + 1];
    for i in 1..=m {
        cur[0] = i;
        for j in 1..=n {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            cur[j] = (prev[j] + 1).min(cur[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[n]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn test_exact_match_scores_100() {
        assert_eq!(weighted_ratio("dental cleaning", "dental cleaning"), 100.0);
        assert_eq!(weighted_ratio("Dental Cleaning", "dental cleaning"), 100.0);
    }

    #[test]
    fn test_word_order_insensitive() {
        let score = weighted_ratio("cleaning dental", "dental cleaning");
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_partial_overlap_scores_high() {
        let score = weighted_ratio("lenses", "contact lenses subsidy");
        assert!(score >= 85.0, "got {score}");
    }

    #[test]
    fn test_disjoint_strings_score_low() {
        let score = weighted_ratio("acupuncture", "speech therapy");
        assert!(score < 40.0, "got {score}");
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(weighted_ratio("", "anything"), 0.0);
        assert_eq!(weighted_ratio("anything", ""), 0.0);
    }

    #[test]
    fn test_hebrew_input() {
        assert_eq!(weighted_ratio("ניקוי אבנית", "ניקוי אבנית"), 100.0);
        assert!(weighted_ratio("אבנית", "ניקוי אבנית") > 80.0);
    }
}
