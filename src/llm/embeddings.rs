use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::llm::retry::{with_retry, RetryPolicy};

/// Texts per embedding request. The Azure/OpenAI embeddings endpoint
/// accepts large batches, but smaller requests keep individual failures
/// (and retries) cheap.
const EMBED_BATCH_SIZE: usize = 64;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

/// Generate embeddings for a batch of texts, chunked and retried per
/// chunk. Output order matches input order.
pub async fn embed_batch(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let mut all_embeddings = Vec::with_capacity(texts.len());
    for chunk in texts.chunks(EMBED_BATCH_SIZE) {
        let mut embeddings =
            with_retry(RetryPolicy::default(), || embed_chunk(client, config, chunk)).await?;
        all_embeddings.append(&mut embeddings);
    }
    Ok(all_embeddings)
}

/// Generate an embedding for a single text.
pub async fn embed_single(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
    text: &str,
) -> Result<Vec<f32>> {
    let results = embed_batch(client, config, &[text.to_string()]).await?;
    results.into_iter().next().context("no embedding returned")
}

async fn embed_chunk(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
    chunk: &[String],
) -> Result<Vec<Vec<f32>>> {
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let request = match config.provider.as_str() {
        "openai" => {
            let url = format!("{}/v1/embeddings", config.base_url);
            let req = EmbedRequest {
                model: Some(&config.model),
                input: chunk,
            };
            client
                .post(&url)
                .header("Authorization", format!("Bearer {api_key}"))
                .json(&req)
        }
        "azure" => {
            // Azure routes by deployment name; the body carries no model.
            let url = format!(
                "{}/openai/deployments/{}/embeddings?api-version={}",
                config.base_url, config.model, config.api_version
            );
            let req = EmbedRequest {
                model: None,
                input: chunk,
            };
            client.post(&url).header("api-key", api_key).json(&req)
        }
        other => anyhow::bail!("unknown embedding provider: {other}"),
    };

    let resp = request
        .send()
        .await
        .context("failed to call embeddings API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("embeddings API returned {status}: {body}");
    }

    let body: EmbedResponse = resp
        .json()
        .await
        .context("failed to parse embeddings response")?;

    Ok(body.data.into_iter().map(|d| d.embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let json = r#"{"data":[{"embedding":[0.1,0.2]},{"embedding":[0.3,0.4]}]}"#;
        let parsed: EmbedResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data.len(), 2);
        assert_eq!(parsed.data[1].embedding, vec![0.3, 0.4]);
    }

    #[test]
    fn test_request_omits_model_for_azure() {
        let input = vec!["text".to_string()];
        let req = EmbedRequest {
            model: None,
            input: &input,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("model"));
        assert!(json.contains("\"input\""));
    }

    #[tokio::test]
    async fn test_unknown_provider_is_an_error() {
        let config = EmbeddingConfig {
            provider: "mystery".to_string(),
            base_url: "http://localhost".to_string(),
            ..EmbeddingConfig::default()
        };
        let client = reqwest::Client::new();
        let err = embed_batch(&client, &config, &["x".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown embedding provider"));
    }
}
