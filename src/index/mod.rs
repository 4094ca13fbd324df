//! The embedding index: row metadata plus one vector per row, built
//! offline by the `build-index` binary and loaded read-only at boot.
//!
//! On-disk format is a single JSON artifact. The metadata rows are
//! stored as a JSON string alongside the raw vectors so the two halves
//! stay in one file and one atomic write.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::EmbeddingConfig;
use crate::llm::embeddings::embed_batch;
use crate::models::BenefitRow;

/// In-memory index. `vectors[i]` embeds `meta[i]`; the two are always
/// the same length.
#[derive(Debug)]
pub struct EmbeddingIndex {
    pub vectors: Vec<Vec<f32>>,
    pub meta: Vec<BenefitRow>,
}

#[derive(Serialize, Deserialize)]
struct IndexArtifact {
    vectors: Vec<Vec<f32>>,
    meta: String,
}

impl EmbeddingIndex {
    pub fn from_parts(vectors: Vec<Vec<f32>>, meta: Vec<BenefitRow>) -> Result<Self> {
        if vectors.len() != meta.len() {
            bail!(
                "index shape mismatch: {} vectors for {} rows",
                vectors.len(),
                meta.len()
            );
        }
        Ok(Self { vectors, meta })
    }

    pub fn len(&self) -> usize {
        self.meta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meta.is_empty()
    }

    /// Write the artifact atomically: serialize to a sibling tmp file,
    /// then rename over the target.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating index directory {}", parent.display()))?;
        }

        let artifact = IndexArtifact {
            vectors: self.vectors.clone(),
            meta: serde_json::to_string(&self.meta).context("serializing index metadata")?,
        };
        let json = serde_json::to_string(&artifact).context("serializing index artifact")?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("writing index to {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("moving index into place at {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Arc<Self>> {
        let json = std::fs::read_to_string(path).with_context(|| {
            format!(
                "reading index from {} (run the build-index binary first)",
                path.display()
            )
        })?;
        let artifact: IndexArtifact =
            serde_json::from_str(&json).context("parsing index artifact")?;
        let meta: Vec<BenefitRow> =
            serde_json::from_str(&artifact.meta).context("parsing index metadata")?;
        let index = Self::from_parts(artifact.vectors, meta)?;
        info!(rows = index.len(), path = %path.display(), "loaded embedding index");
        Ok(Arc::new(index))
    }
}

/// Text that gets embedded for a row. Payer and tier ride along in the
/// same "Payer:X Tier:Y" shape the retriever appends to queries, so
/// hinted queries land nearer their matching rows.
pub fn embedding_input(row: &BenefitRow) -> String {
    format!(
        "{} | {} | Payer:{} | Tier:{}\n{}",
        row.category,
        row.service,
        row.payer.as_str(),
        row.tier.as_str(),
        row.text
    )
}

/// Embed every row and assemble the index.
pub async fn build_index(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
    rows: Vec<BenefitRow>,
) -> Result<EmbeddingIndex> {
    let inputs: Vec<String> = rows.iter().map(embedding_input).collect();
    let vectors = embed_batch(client, config, &inputs).await?;
    if vectors.len() != rows.len() {
        bail!(
            "embedding count mismatch: got {} vectors for {} rows",
            vectors.len(),
            rows.len()
        );
    }
    EmbeddingIndex::from_parts(vectors, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Payer, Tier};

    fn sample_rows() -> Vec<BenefitRow> {
        vec![
            BenefitRow {
                category: "מרפאות שיניים".to_string(),
                service: "ניקוי אבנית".to_string(),
                payer: Payer::Maccabi,
                tier: Tier::Gold,
                text: "פעמיים בשנה".to_string(),
                source: "dental_services.html".to_string(),
            },
            BenefitRow {
                category: "אופטומטריה".to_string(),
                service: "עדשות מגע".to_string(),
                payer: Payer::Clalit,
                tier: Tier::Silver,
                text: "השתתפות עצמית".to_string(),
                source: "optometry_services.html".to_string(),
            },
        ]
    }

    #[test]
    fn test_from_parts_rejects_length_mismatch() {
        let rows = sample_rows();
        let err = EmbeddingIndex::from_parts(vec![vec![1.0]], rows);
        assert!(err.is_err());
    }

    #[test]
    fn test_embedding_input_carries_hints() {
        let rows = sample_rows();
        let input = embedding_input(&rows[0]);
        assert!(input.contains("Payer:מכבי"));
        assert!(input.contains("Tier:זהב"));
        assert!(input.contains("ניקוי אבנית"));
        assert!(input.contains("פעמיים בשנה"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let rows = sample_rows();
        let vectors = vec![vec![1.0f32, 0.0], vec![0.0, 1.0]];
        let index = EmbeddingIndex::from_parts(vectors, rows).unwrap();

        let path = std::env::temp_dir().join(format!(
            "kb_index_test_{}.json",
            std::process::id()
        ));
        index.save(&path).unwrap();

        let loaded = EmbeddingIndex::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.vectors[0], vec![1.0, 0.0]);
        assert_eq!(loaded.meta[1].service, "עדשות מגע");
        assert_eq!(loaded.meta[1].payer, Payer::Clalit);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file_mentions_build_step() {
        let err = EmbeddingIndex::load(Path::new("/nonexistent/kb_index.json")).unwrap_err();
        assert!(format!("{err:#}").contains("build-index"));
    }
}
