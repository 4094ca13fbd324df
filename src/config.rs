use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the source HTML benefit documents.
    pub kb_dir: PathBuf,
    /// Path of the persisted embedding index artifact.
    pub index_path: PathBuf,
    /// Server bind address.
    pub bind_addr: String,
    /// Chat-completion service configuration.
    pub llm: LlmConfig,
    /// Embedding service configuration (may be a different endpoint).
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai" or "azure"
    pub provider: String,
    /// Base URL for the chat API
    pub base_url: String,
    /// Model (or Azure deployment) name for chat
    pub chat_model: String,
    /// API key
    pub api_key: Option<String>,
    /// Azure api-version query parameter
    pub api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "openai" or "azure"
    pub provider: String,
    pub base_url: String,
    /// Model (or Azure deployment) name for embeddings
    pub model: String,
    pub api_key: Option<String>,
    pub api_version: String,
    /// Embedding vector dimension
    pub dim: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kb_dir: PathBuf::from("./kb_html"),
            index_path: PathBuf::from("./data/kb_index.json"),
            bind_addr: "127.0.0.1:8080".to_string(),
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "azure".to_string(),
            base_url: String::new(),
            chat_model: "gpt-4o-mini".to_string(),
            api_key: None,
            api_version: "2024-06-01".to_string(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "azure".to_string(),
            base_url: String::new(),
            model: "text-embedding-ada-002".to_string(),
            api_key: None,
            api_version: "2024-06-01".to_string(),
            dim: 1536,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("BENEFITS_KB_DIR") {
            config.kb_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("BENEFITS_INDEX_PATH") {
            config.index_path = PathBuf::from(path);
        }
        if let Ok(addr) = std::env::var("BENEFITS_BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = sanitize_endpoint(&url);
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(ver) = std::env::var("LLM_API_VERSION") {
            config.llm.api_version = ver;
        }

        // Embedding service falls back to the chat endpoint when not
        // configured separately.
        config.embedding.provider = config.llm.provider.clone();
        config.embedding.base_url = config.llm.base_url.clone();
        config.embedding.api_key = config.llm.api_key.clone();
        config.embedding.api_version = config.llm.api_version.clone();

        if let Ok(provider) = std::env::var("EMBEDDING_PROVIDER") {
            config.embedding.provider = provider;
        }
        if let Ok(url) = std::env::var("EMBEDDING_BASE_URL") {
            config.embedding.base_url = sanitize_endpoint(&url);
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Ok(key) = std::env::var("EMBEDDING_API_KEY") {
            config.embedding.api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("EMBEDDING_DIM") {
            if let Ok(d) = dim.parse() {
                config.embedding.dim = d;
            }
        }

        config
    }

    /// Check that the external-service credentials required at startup are
    /// present. Fatal when they are not; there is no point booting a
    /// service that cannot reach its chat or embedding backend.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.llm.base_url.is_empty() {
            return Err(AppError::Config(
                "LLM_BASE_URL is required".to_string(),
            ));
        }
        if self.llm.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(AppError::Config("LLM_API_KEY is required".to_string()));
        }
        self.validate_embedding()
    }

    /// Embedding-side validation only (enough for the offline index build).
    pub fn validate_embedding(&self) -> Result<(), AppError> {
        if self.embedding.base_url.is_empty() {
            return Err(AppError::Config(
                "EMBEDDING_BASE_URL (or LLM_BASE_URL) is required".to_string(),
            ));
        }
        if self.embedding.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(AppError::Config(
                "EMBEDDING_API_KEY (or LLM_API_KEY) is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Normalize a service endpoint: drop a trailing slash and anything from
/// an `/openai` path segment onward, so both bare resource URLs and full
/// deployment URLs are accepted.
fn sanitize_endpoint(url: &str) -> String {
    let url = match url.find("/openai") {
        Some(i) => &url[..i],
        None => url,
    };
    url.trim_end_matches('/').to_string()
}
