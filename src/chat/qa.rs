//! Phase B: answer benefit questions grounded in retrieved snippets.

use tracing::info;

use crate::chat::lang::detect_lang;
use crate::chat::prompts::{build_qa_messages, no_match_line};
use crate::chat::{last_user_message, sanitize_history};
use crate::error::AppError;
use crate::llm::chat::{chat_completion, ChatOptions};
use crate::models::{QaRequest, QaResponse};
use crate::state::AppState;

const TOP_K: usize = 5;

/// Answer one question: retrieve against the last user message with the
/// profile's payer/tier as hints, then ask the model to answer from the
/// snippets only. No snippets means a canned no-match reply with no
/// model call at all.
pub async fn answer_question(state: &AppState, req: QaRequest) -> Result<QaResponse, AppError> {
    let lang = detect_lang(req.language_hint.as_deref(), &req.messages);
    let history = sanitize_history(&req.messages);

    let query = last_user_message(&history)
        .ok_or_else(|| AppError::Validation("no user query found".to_string()))?
        .to_string();

    let payer = req.user_profile.payer.filter(|p| p.is_known());
    let tier = req.user_profile.tier.filter(|t| t.is_known());

    let snippets = state
        .retriever
        .search(
            &state.http_client,
            &state.config.embedding,
            &query,
            payer,
            tier,
            TOP_K,
        )
        .await
        .map_err(AppError::upstream)?;

    info!(snippets = snippets.len(), "retrieval complete");

    if snippets.is_empty() {
        return Ok(QaResponse {
            answer: no_match_line(lang).to_string(),
            used_snippets: Vec::new(),
        });
    }

    let messages = build_qa_messages(&history, &snippets, &req.user_profile, lang);
    let options = ChatOptions {
        temperature: 0.0,
        max_tokens: 700,
        ..ChatOptions::default()
    };

    let outcome = chat_completion(&state.http_client, &state.config.llm, &messages, &options)
        .await
        .map_err(AppError::upstream)?;

    Ok(QaResponse {
        answer: outcome.content,
        used_snippets: snippets,
    })
}
