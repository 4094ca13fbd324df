//! Non-streaming chat-completion client with tool-call support.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;

use crate::config::LlmConfig;
use crate::llm::retry::{with_retry, RetryPolicy};
use crate::models::ChatMessage;

/// Per-request knobs. `tools` carries the raw tool schema array when the
/// caller wants the model to be able to call functions.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub tools: Option<serde_json::Value>,
    pub tool_choice: Option<String>,
}

/// A function call requested by the model. Arguments are the raw JSON
/// string as returned, parsed by the caller.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: String,
}

/// What came back from one completion: assistant text (possibly empty)
/// and any tool calls.
#[derive(Debug, Clone, Default)]
pub struct ChatOutcome {
    pub content: String,
    pub tool_calls: Vec<ToolInvocation>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<RawToolCall>,
}

#[derive(Deserialize)]
struct RawToolCall {
    #[serde(rename = "type")]
    kind: String,
    function: RawFunction,
}

#[derive(Deserialize)]
struct RawFunction {
    name: String,
    arguments: String,
}

/// Run one chat completion against the configured provider, with
/// retries on transport or HTTP failure.
pub async fn chat_completion(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: &[ChatMessage],
    options: &ChatOptions,
) -> Result<ChatOutcome> {
    let response = with_retry(RetryPolicy::default(), || {
        request_completion(client, config, messages, options)
    })
    .await?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .context("chat API returned no choices")?;

    Ok(outcome_from_message(choice.message))
}

fn outcome_from_message(message: ResponseMessage) -> ChatOutcome {
    let tool_calls = message
        .tool_calls
        .into_iter()
        .filter(|c| c.kind == "function")
        .map(|c| ToolInvocation {
            name: c.function.name,
            arguments: c.function.arguments,
        })
        .collect();

    ChatOutcome {
        content: message.content.unwrap_or_default(),
        tool_calls,
    }
}

async fn request_completion(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: &[ChatMessage],
    options: &ChatOptions,
) -> Result<CompletionResponse> {
    let mut payload = json!({
        "messages": messages,
        "temperature": options.temperature,
        "max_tokens": options.max_tokens,
    });
    if let Some(tools) = &options.tools {
        payload["tools"] = tools.clone();
    }
    if let Some(choice) = &options.tool_choice {
        payload["tool_choice"] = json!(choice);
    }

    let api_key = config.api_key.as_deref().unwrap_or_default();
    let request = match config.provider.as_str() {
        "openai" => {
            payload["model"] = json!(config.chat_model);
            let url = format!("{}/v1/chat/completions", config.base_url);
            client
                .post(&url)
                .header("Authorization", format!("Bearer {api_key}"))
                .json(&payload)
        }
        "azure" => {
            let url = format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                config.base_url, config.chat_model, config.api_version
            );
            client.post(&url).header("api-key", api_key).json(&payload)
        }
        other => anyhow::bail!("unknown LLM provider: {other}"),
    };

    let resp = request.send().await.context("failed to call chat API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("chat API returned {status}: {body}");
    }

    resp.json().await.context("failed to parse chat response")
}
