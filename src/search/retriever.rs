//! The hybrid retrieval pipeline.
//!
//! Fixed stage order: cheap keyword gating narrows candidates before
//! the expensive semantic scoring, and payer/tier hints progressively
//! tighten then safety-net-widen the pool.
//!
//! 1. category gating (query keywords → source allow-list)
//! 2. fuzzy keyword prefilter on `service` (top 200)
//! 3. exact payer+tier widening
//! 4. soft narrowing by payer, then tier (never to empty)
//! 5. safety floor (empty candidates reset to the full set)
//! 6. same-payer backfill when no exact payer+tier pair survives
//! 7. semantic re-rank (cosine vs. hint-augmented query embedding)
//! 8. exact-match boosts (×1.15 payer, ×1.10 tier)
//! 9. diversity-aware top-k by (service, payer, tier)
//!
//! Each stage is a pure function from (candidate set, context) to a new
//! candidate set, so stages are unit-testable in isolation.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Result;

use crate::config::EmbeddingConfig;
use crate::index::EmbeddingIndex;
use crate::llm::embeddings::embed_single;
use crate::models::{BenefitRow, Payer, Snippet, Tier};
use crate::search::fuzzy::weighted_ratio;

/// Query keywords → source document (category gating). Multi-language
/// variants of the same category map to the same document; several keys
/// are deliberate prefixes ("dent", "pregnan").
const QUERY_SOURCE_HINTS: &[(&str, &str)] = &[
    // Dental
    ("שיניים", "dental_services.html"),
    ("שן", "dental_services.html"),
    ("dental", "dental_services.html"),
    ("dent", "dental_services.html"),
    // Optometry
    ("אופטומטר", "optometry_services.html"),
    ("עדשות", "optometry_services.html"),
    ("משקפ", "optometry_services.html"),
    ("ראיה", "optometry_services.html"),
    ("ראייה", "optometry_services.html"),
    ("laser", "optometry_services.html"),
    ("optometry", "optometry_services.html"),
    ("lenses", "optometry_services.html"),
    // Alternative medicine
    ("דיקור", "alternative_services.html"),
    ("אקופונקטורה", "alternative_services.html"),
    ("שיאצו", "alternative_services.html"),
    ("רפואה משלימה", "alternative_services.html"),
    ("acupuncture", "alternative_services.html"),
    ("complementary", "alternative_services.html"),
    // Communication clinic
    ("תקשורת", "communication_clinic_services.html"),
    ("גמגום", "communication_clinic_services.html"),
    ("בליעה", "communication_clinic_services.html"),
    ("speech", "communication_clinic_services.html"),
    // Pregnancy
    ("הריון", "pregnancy_services.html"),
    ("סקירה", "pregnancy_services.html"),
    ("prenatal", "pregnancy_services.html"),
    ("pregnan", "pregnancy_services.html"),
    // Workshops
    ("סדנא", "workshops_services.html"),
    ("סדנאות", "workshops_services.html"),
    ("עישון", "workshops_services.html"),
    ("wellness", "workshops_services.html"),
    ("workshop", "workshops_services.html"),
];

/// Light domain synonyms to help the keyword prefilter.
const SERVICE_SYNONYMS: &[&str] = &[
    "עדשות",
    "contact lens",
    "contact lenses",
    "lenses",
    "טיפולי שיניים",
    "מרפאות שיניים",
    "טיפול שיניים",
    "dental",
    "dentistry",
    "tooth",
    "teeth",
    "לייזר",
    "laser",
    "vision correction",
];

const PREFILTER_CAP: usize = 200;
const PAYER_BOOST: f32 = 1.15;
const TIER_BOOST: f32 = 1.10;

/// Read-only retriever over an immutable index loaded at boot.
pub struct HybridRetriever {
    index: Arc<EmbeddingIndex>,
}

impl HybridRetriever {
    pub fn new(index: Arc<EmbeddingIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    /// Full search: plan candidates, embed the hint-augmented query, and
    /// rank. An empty knowledge base yields an empty result; an embedding
    /// failure (after retries) propagates as an error since retrieval
    /// cannot proceed without the query vector.
    pub async fn search(
        &self,
        client: &reqwest::Client,
        config: &EmbeddingConfig,
        query: &str,
        payer: Option<Payer>,
        tier: Option<Tier>,
        top_k: usize,
    ) -> Result<Vec<Snippet>> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let mut qtext = query.to_string();
        if let Some(p) = payer {
            let _ = write!(qtext, " Payer:{}", p.as_str());
        }
        if let Some(t) = tier {
            let _ = write!(qtext, " Tier:{}", t.as_str());
        }
        let qvec = embed_single(client, config, &qtext).await?;

        Ok(rank_with_query_vector(
            &self.index,
            query,
            payer,
            tier,
            top_k,
            &qvec,
        ))
    }
}

/// Candidate planning plus ranking against a precomputed query vector.
/// This is the whole pipeline minus the embedding call.
pub fn rank_with_query_vector(
    index: &EmbeddingIndex,
    query: &str,
    payer: Option<Payer>,
    tier: Option<Tier>,
    top_k: usize,
    query_vector: &[f32],
) -> Vec<Snippet> {
    let candidates = plan_candidates(&index.meta, query, payer, tier);
    rank_candidates(index, &candidates, query_vector, payer, tier, top_k)
}

/// Stages 1–6: produce the candidate index set for semantic ranking.
pub fn plan_candidates(
    meta: &[BenefitRow],
    query: &str,
    payer: Option<Payer>,
    tier: Option<Tier>,
) -> Vec<usize> {
    let allowed = allowed_sources(query);
    let mut candidates = keyword_prefilter(meta, query, &allowed, PREFILTER_CAP);
    candidates = widen_exact_matches(meta, candidates, &allowed, payer, tier);
    candidates = narrow_by_hints(meta, candidates, payer, tier);
    candidates = safety_floor(meta.len(), candidates);
    candidates = backfill_same_payer(meta, candidates, &allowed, payer, tier);
    candidates
}

/// Stage 1: keyword hits restrict candidates to their source documents.
/// No hit means no restriction.
pub fn allowed_sources(query: &str) -> HashSet<&'static str> {
    let lower = query.to_lowercase();
    let tokens: Vec<&str> = crate::extract::aliases::tokenize(&lower).collect();

    let mut allowed = HashSet::new();
    for (keyword, source) in QUERY_SOURCE_HINTS {
        let hit = if keyword.contains(' ') {
            lower.contains(keyword)
        } else {
            tokens.iter().any(|t| t.starts_with(keyword))
        };
        if hit {
            allowed.insert(*source);
        }
    }
    allowed
}

/// Stage 2: fuzzy prefilter on `service`, best of the raw query and the
/// domain synonyms, keeping the top `cap` within gated sources. Zero
/// survivors fall back to every row.
pub fn keyword_prefilter(
    meta: &[BenefitRow],
    query: &str,
    allowed: &HashSet<&'static str>,
    cap: usize,
) -> Vec<usize> {
    let mut scored: Vec<(usize, f32)> = meta
        .iter()
        .enumerate()
        .filter(|(_, row)| allowed.is_empty() || allowed.contains(row.source.as_str()))
        .map(|(i, row)| {
            let mut best = weighted_ratio(query, &row.service);
            for synonym in SERVICE_SYNONYMS {
                best = best.max(weighted_ratio(synonym, &row.service));
            }
            (i, best)
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let candidates: Vec<usize> = scored.into_iter().take(cap).map(|(i, _)| i).collect();

    if candidates.is_empty() {
        (0..meta.len()).collect()
    } else {
        candidates
    }
}

/// Stage 3: with both hints present, union in every gated row matching
/// payer and tier exactly, so the prefilter cutoff can never drop them.
pub fn widen_exact_matches(
    meta: &[BenefitRow],
    candidates: Vec<usize>,
    allowed: &HashSet<&'static str>,
    payer: Option<Payer>,
    tier: Option<Tier>,
) -> Vec<usize> {
    let (Some(payer), Some(tier)) = (payer, tier) else {
        return candidates;
    };
    let exact: Vec<usize> = meta
        .iter()
        .enumerate()
        .filter(|(_, row)| allowed.is_empty() || allowed.contains(row.source.as_str()))
        .filter(|(_, row)| row.payer == payer && row.tier == tier)
        .map(|(i, _)| i)
        .collect();
    union(candidates, exact)
}

/// Stage 4: soft preference for hint matches — narrow only when at
/// least one candidate matches, payer first, then tier independently.
pub fn narrow_by_hints(
    meta: &[BenefitRow],
    mut candidates: Vec<usize>,
    payer: Option<Payer>,
    tier: Option<Tier>,
) -> Vec<usize> {
    if let Some(payer) = payer {
        let matching: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&i| meta[i].payer == payer)
            .collect();
        if !matching.is_empty() {
            candidates = matching;
        }
    }
    if let Some(tier) = tier {
        let matching: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&i| meta[i].tier == tier)
            .collect();
        if !matching.is_empty() {
            candidates = matching;
        }
    }
    candidates
}

/// Stage 5: gating/narrowing must never self-defeat to zero.
pub fn safety_floor(total_rows: usize, candidates: Vec<usize>) -> Vec<usize> {
    if candidates.is_empty() {
        (0..total_rows).collect()
    } else {
        candidates
    }
}

/// Stage 6: when both hints are present but no candidate matches the
/// exact pair, union in every gated same-payer row regardless of tier.
/// Broadens recall for queries whose exact tier combination is absent.
pub fn backfill_same_payer(
    meta: &[BenefitRow],
    candidates: Vec<usize>,
    allowed: &HashSet<&'static str>,
    payer: Option<Payer>,
    tier: Option<Tier>,
) -> Vec<usize> {
    let (Some(payer), Some(tier)) = (payer, tier) else {
        return candidates;
    };
    let has_exact = candidates
        .iter()
        .any(|&i| meta[i].payer == payer && meta[i].tier == tier);
    if has_exact {
        return candidates;
    }
    let same_payer: Vec<usize> = meta
        .iter()
        .enumerate()
        .filter(|(_, row)| row.payer == payer)
        .filter(|(_, row)| allowed.is_empty() || allowed.contains(row.source.as_str()))
        .map(|(i, _)| i)
        .collect();
    union(candidates, same_payer)
}

/// Stages 7–9 against a precomputed query vector: cosine similarity,
/// exact-match boosts, then diversity-aware top-k selection.
pub fn rank_candidates(
    index: &EmbeddingIndex,
    candidates: &[usize],
    query_vector: &[f32],
    payer: Option<Payer>,
    tier: Option<Tier>,
    top_k: usize,
) -> Vec<Snippet> {
    let mut scored: Vec<(usize, f32)> = candidates
        .iter()
        .map(|&i| {
            let row = &index.meta[i];
            let mut score = cosine_similarity(query_vector, &index.vectors[i]);
            if payer == Some(row.payer) {
                score *= PAYER_BOOST;
            }
            if tier == Some(row.tier) {
                score *= TIER_BOOST;
            }
            (i, score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    // Walk at most max(2k, 10) of the sorted ranking, keeping the first
    // occurrence of each (service, payer, tier) key.
    let window = scored.len().min((2 * top_k).max(10));
    let mut seen: HashSet<(&str, Payer, Tier)> = HashSet::new();
    let mut results = Vec::new();

    for &(i, score) in &scored[..window] {
        let row = &index.meta[i];
        if !seen.insert((row.service.as_str(), row.payer, row.tier)) {
            continue;
        }
        results.push(Snippet {
            score,
            category: row.category.clone(),
            service: row.service.clone(),
            payer: row.payer,
            tier: row.tier,
            text: row.text.clone(),
            source: row.source.clone(),
        });
        if results.len() >= top_k {
            break;
        }
    }
    results
}

/// Order-preserving union: keeps `base` order, appends unseen extras.
fn union(base: Vec<usize>, extra: Vec<usize>) -> Vec<usize> {
    let mut seen: HashSet<usize> = base.iter().copied().collect();
    let mut out = base;
    for i in extra {
        if seen.insert(i) {
            out.push(i);
        }
    }
    out
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
