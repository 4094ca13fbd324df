//! End-to-end coverage of the offline path: HTML extraction into an
//! index, then the full retrieval pipeline against synthetic query
//! vectors (no network).

use std::collections::HashSet;
use std::sync::Arc;

use benefits_chat::config::EmbeddingConfig;
use benefits_chat::extract::extract_html;
use benefits_chat::index::{embedding_input, EmbeddingIndex};
use benefits_chat::models::{BenefitRow, Payer, Tier};
use benefits_chat::search::retriever::{rank_with_query_vector, HybridRetriever};

const DENTAL_DOC: &str = r#"
    <html><body>
    <table>
      <tr><th>שירות</th><th>מכבי</th><th>מאוחדת</th><th>כללית</th></tr>
      <tr>
        <td>ניקוי אבנית</td>
        <td>זהב: חינם כסף: 50% הנחה ארד: 30% הנחה</td>
        <td>זהב: 70% הנחה</td>
        <td>זהב: 60% הנחה כסף: 40% הנחה</td>
      </tr>
      <tr>
        <td>טיפול שורש</td>
        <td>זהב: 80% הנחה</td>
        <td>כסף: השתתפות עצמית</td>
        <td></td>
      </tr>
    </table>
    </body></html>"#;

const OPTOMETRY_DOC: &str = r#"
    <html><body>
    <table>
      <tr><th>שירות</th><th>מכבי</th><th>כללית</th></tr>
      <tr>
        <td>עדשות מגע</td>
        <td>זהב: סבסוד מלא</td>
        <td>זהב: סבסוד חלקי</td>
      </tr>
    </table>
    </body></html>"#;

/// Extract both documents and build an index with one-hot vectors, so
/// every row has equal base similarity to a uniform query vector and
/// ranking is decided by the pipeline's gating and boosts alone.
fn build_test_index() -> EmbeddingIndex {
    let mut rows = extract_html(DENTAL_DOC, "dental_services.html");
    rows.extend(extract_html(OPTOMETRY_DOC, "optometry_services.html"));
    assert!(!rows.is_empty());

    let n = rows.len();
    let vectors: Vec<Vec<f32>> = (0..n)
        .map(|i| {
            let mut v = vec![0.0f32; n];
            v[i] = 1.0;
            v
        })
        .collect();
    EmbeddingIndex::from_parts(vectors, rows).unwrap()
}

fn uniform_query(n: usize) -> Vec<f32> {
    vec![1.0f32; n]
}

#[test]
fn extraction_feeds_a_consistent_index() {
    let index = build_test_index();
    assert_eq!(index.vectors.len(), index.meta.len());

    for row in &index.meta {
        assert!(!row.text.is_empty());
        let input = embedding_input(row);
        assert!(input.contains(&row.service));
        assert!(input.contains("Payer:"));
    }
}

#[test]
fn hinted_dental_query_returns_exact_match_first() {
    let index = build_test_index();
    let results = rank_with_query_vector(
        &index,
        "כמה עולה ניקוי אבנית אצל רופא שיניים?",
        Some(Payer::Maccabi),
        Some(Tier::Gold),
        5,
        &uniform_query(index.len()),
    );

    assert!(!results.is_empty());
    // Gating restricts to the dental document.
    assert!(results.iter().all(|r| r.source == "dental_services.html"));
    // The boosted exact payer+tier row wins.
    assert_eq!(results[0].payer, Payer::Maccabi);
    assert_eq!(results[0].tier, Tier::Gold);
}

#[test]
fn exact_pair_always_survives_when_present() {
    let index = build_test_index();
    for (payer, tier) in [
        (Payer::Maccabi, Tier::Silver),
        (Payer::Meuhedet, Tier::Gold),
        (Payer::Clalit, Tier::Silver),
    ] {
        let results = rank_with_query_vector(
            &index,
            "אבנית",
            Some(payer),
            Some(tier),
            5,
            &uniform_query(index.len()),
        );
        assert!(
            results.iter().any(|r| r.payer == payer && r.tier == tier),
            "missing exact pair for {payer:?}/{tier:?}"
        );
    }
}

#[test]
fn absent_pair_falls_back_to_same_payer() {
    let index = build_test_index();
    // Clalit has no bronze dental rows; results must still be non-empty
    // and prefer Clalit rows over other payers.
    let results = rank_with_query_vector(
        &index,
        "טיפולי שיניים",
        Some(Payer::Clalit),
        Some(Tier::Bronze),
        5,
        &uniform_query(index.len()),
    );
    assert!(!results.is_empty());
    assert_eq!(results[0].payer, Payer::Clalit);
}

#[test]
fn unhinted_query_searches_everything() {
    let index = build_test_index();
    let results = rank_with_query_vector(
        &index,
        "מה מגיע לי?",
        None,
        None,
        10,
        &uniform_query(index.len()),
    );
    // No gating keyword and no hints: both documents contribute.
    let sources: HashSet<&str> = results.iter().map(|r| r.source.as_str()).collect();
    assert!(sources.contains("dental_services.html"));
    assert!(sources.contains("optometry_services.html"));
}

#[test]
fn results_are_diverse_and_bounded() {
    let index = build_test_index();
    let results = rank_with_query_vector(
        &index,
        "שיניים",
        None,
        None,
        3,
        &uniform_query(index.len()),
    );
    assert!(results.len() <= 3);

    let mut keys = HashSet::new();
    for r in &results {
        assert!(
            keys.insert((r.service.clone(), r.payer, r.tier)),
            "duplicate (service, payer, tier) in results"
        );
    }
}

#[test]
fn scores_are_sorted_descending() {
    let index = build_test_index();
    let results = rank_with_query_vector(
        &index,
        "עדשות מגע",
        Some(Payer::Maccabi),
        Some(Tier::Gold),
        5,
        &uniform_query(index.len()),
    );
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn empty_index_yields_no_results() {
    let index = EmbeddingIndex::from_parts(Vec::new(), Vec::new()).unwrap();
    let results = rank_with_query_vector(&index, "anything", None, None, 5, &[]);
    assert!(results.is_empty());
}

#[tokio::test]
async fn unreachable_embedding_service_fails_the_search() {
    let index = Arc::new(build_test_index());
    let retriever = HybridRetriever::new(index);

    let config = EmbeddingConfig {
        provider: "openai".to_string(),
        base_url: "http://127.0.0.1:9".to_string(),
        api_key: Some("test".to_string()),
        ..EmbeddingConfig::default()
    };
    let client = reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_millis(200))
        .build()
        .unwrap();

    let result = retriever
        .search(&client, &config, "ניקוי אבנית", None, None, 5)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn empty_index_search_skips_the_embedding_call() {
    // An empty knowledge base returns no snippets without touching the
    // network, so an unreachable endpoint is fine here.
    let index = Arc::new(EmbeddingIndex::from_parts(Vec::new(), Vec::new()).unwrap());
    let retriever = HybridRetriever::new(index);

    let config = EmbeddingConfig {
        provider: "openai".to_string(),
        base_url: "http://127.0.0.1:9".to_string(),
        ..EmbeddingConfig::default()
    };
    let client = reqwest::Client::new();

    let snippets = retriever
        .search(&client, &config, "anything", None, None, 5)
        .await
        .unwrap();
    assert!(snippets.is_empty());
}

#[test]
fn index_round_trips_through_disk() {
    let index = build_test_index();
    let path = std::env::temp_dir().join(format!(
        "benefits_index_it_{}.json",
        std::process::id()
    ));
    index.save(&path).unwrap();
    let loaded = EmbeddingIndex::load(&path).unwrap();
    assert_eq!(loaded.len(), index.len());

    let original: Vec<&BenefitRow> = index.meta.iter().collect();
    let restored: Vec<&BenefitRow> = loaded.meta.iter().collect();
    assert_eq!(original, restored);

    std::fs::remove_file(&path).unwrap();
}
