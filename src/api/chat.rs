use axum::extract::State;
use axum::Json;

use crate::chat::collect::collect_profile_turn;
use crate::chat::qa::answer_question;
use crate::error::AppError;
use crate::models::{CollectRequest, CollectResponse, QaRequest, QaResponse};
use crate::state::AppState;

/// POST /chat/collect
pub async fn collect(
    State(state): State<AppState>,
    Json(req): Json<CollectRequest>,
) -> Result<Json<CollectResponse>, AppError> {
    let resp = collect_profile_turn(&state, req).await?;
    Ok(Json(resp))
}

/// POST /chat/qa
pub async fn qa(
    State(state): State<AppState>,
    Json(req): Json<QaRequest>,
) -> Result<Json<QaResponse>, AppError> {
    let resp = answer_question(&state, req).await?;
    Ok(Json(resp))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "index_rows": state.retriever.index().len(),
    }))
}
