use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::index::EmbeddingIndex;
use crate::search::retriever::HybridRetriever;

/// Shared application state. The index is loaded once at boot and
/// read-only thereafter.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub retriever: Arc<HybridRetriever>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let index = EmbeddingIndex::load(&config.index_path)
            .map_err(|e| AppError::Index(format!("{e:#}")))?;

        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Config(format!("building HTTP client: {e}")))?;

        Ok(Self {
            config,
            retriever: Arc::new(HybridRetriever::new(index)),
            http_client,
        })
    }
}
