//! Offline index builder: extract benefit rows from the HTML knowledge
//! base, embed them, and persist the index artifact the server loads.

use tracing_subscriber::EnvFilter;

use benefits_chat::config::Config;
use benefits_chat::extract::load_kb;
use benefits_chat::index::build_index;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    config.validate_embedding()?;

    tracing::info!("Knowledge base: {}", config.kb_dir.display());
    let rows = load_kb(&config.kb_dir)?;
    tracing::info!("Extracted {} benefit rows", rows.len());

    let client = reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(10))
        .timeout(std::time::Duration::from_secs(60))
        .build()?;

    let index = build_index(&client, &config.embedding, rows).await?;
    index.save(&config.index_path)?;
    tracing::info!(
        "Wrote index with {} rows to {}",
        index.len(),
        config.index_path.display()
    );

    Ok(())
}
