use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use benefits_chat::api;
use benefits_chat::config::Config;
use benefits_chat::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    config.validate()?;
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);
    tracing::info!("Index path: {}", config.index_path.display());

    let state = AppState::new(config.clone())?;

    let app = Router::new()
        .route("/chat/collect", post(api::chat::collect))
        .route("/chat/qa", post(api::chat::qa))
        .route("/health", get(api::chat::health))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
