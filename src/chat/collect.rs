//! Phase A: collect and confirm the user profile.

use tracing::{debug, info};

use crate::chat::lang::detect_lang;
use crate::chat::prompts::{
    build_collection_messages, confirmation_line, correction_message, submit_profile_tool,
};
use crate::chat::validators::{apply_profile_args, mask_pii, ProfileArgs};
use crate::chat::sanitize_history;
use crate::error::AppError;
use crate::llm::chat::{chat_completion, ChatOptions};
use crate::models::{CollectRequest, CollectResponse};
use crate::state::AppState;

/// Run one collection turn: forward the sanitized history with the
/// `submit_profile` tool attached, and fold any tool call back into the
/// profile. The profile is confirmed only when a submission arrives and
/// every field validates; validation failures turn into a correction
/// message so the conversation can continue.
pub async fn collect_profile_turn(
    state: &AppState,
    req: CollectRequest,
) -> Result<CollectResponse, AppError> {
    let lang = detect_lang(req.language_hint.as_deref(), &req.messages);
    let history = sanitize_history(&req.messages);
    let mut profile = req.user_profile.unwrap_or_default();

    let messages = build_collection_messages(&history, &profile, lang);
    let options = ChatOptions {
        temperature: 0.2,
        max_tokens: 600,
        tools: Some(submit_profile_tool()),
        tool_choice: Some("auto".to_string()),
    };

    let outcome = chat_completion(&state.http_client, &state.config.llm, &messages, &options)
        .await
        .map_err(AppError::upstream)?;

    let submission = outcome
        .tool_calls
        .iter()
        .find(|c| c.name == "submit_profile");

    let mut confirmed = false;
    let mut assistant_message = outcome.content.clone();

    if let Some(call) = submission {
        debug!(arguments = %mask_pii(&call.arguments), "profile submission received");
        let args: ProfileArgs = serde_json::from_str(&call.arguments).unwrap_or_default();
        let errors = apply_profile_args(&args, &mut profile);

        if errors.is_empty() {
            confirmed = true;
            info!("profile confirmed");
            if assistant_message.trim().is_empty() {
                assistant_message = confirmation_line(lang).to_string();
            }
        } else {
            info!(error_count = errors.len(), "profile submission failed validation");
            assistant_message = correction_message(&errors, lang);
        }
    }

    Ok(CollectResponse {
        assistant_message,
        updated_profile: profile,
        profile_confirmed: confirmed,
    })
}
