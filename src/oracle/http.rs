//! HTTP adapter for the hosted oracle (OpenRouter chat completions)
//!
//! Includes automatic retry with exponential backoff for rate limits. There
//! is no hard cancellation: once a call is in flight it runs to completion
//! and stale results are discarded by the session's epoch check.

use super::prompts;
use super::{OracleError, OracleRequest, Scope};
use crate::config::Config;
use crate::suggest::{Suggestion, SuggestionKind};
use serde::{Deserialize, Serialize};

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const MODEL: &str = "openai/gpt-4o-mini";
const MAX_TOKENS: u32 = 2048;

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 2000;
const BACKOFF_MULTIPLIER: u64 = 2;

/// Get the configured OpenRouter API key, if any
fn api_key() -> Option<String> {
    Config::load().get_api_key()
}

/// Check whether the oracle can be reached at all (a key is configured)
pub fn is_available() -> bool {
    api_key().is_some()
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: String,
}

/// Call the oracle with a full-document request and parse the batch.
/// An empty batch is a valid response ("no issues found").
pub async fn generate(request: &OracleRequest) -> Result<Vec<Suggestion>, OracleError> {
    let (system, user) = prompts::review_prompt(request);
    let content = call_chat(&system, &user).await?;
    super::parse::parse_batch(&content, kind_for_scope(request.scope))
}

/// Ask for one fresh alternative for a single span, avoiding the request's
/// excluded phrasings. `None` means the oracle had nothing new to offer.
pub async fn resuggest(request: &OracleRequest) -> Result<Option<Suggestion>, OracleError> {
    let (system, user) = prompts::resuggest_prompt(request);
    let content = call_chat(&system, &user).await?;
    let batch = super::parse::parse_batch(&content, kind_for_scope(request.scope))?;
    // The prompt pins "original" to the span verbatim; tolerate a model that
    // echoes something else by falling back to the first element.
    Ok(batch
        .iter()
        .find(|s| s.original_text == request.text)
        .or_else(|| batch.first())
        .cloned())
}

fn kind_for_scope(scope: Scope) -> SuggestionKind {
    match scope {
        Scope::Grammar => SuggestionKind::Grammar,
        Scope::Tone | Scope::Both => SuggestionKind::Tone,
    }
}

/// Extract a retry-after hint from a rate-limit response body, if present
fn parse_retry_after(text: &str) -> Option<u64> {
    let text_lower = text.to_lowercase();
    let pos = text_lower.find("retry")?;
    for word in text_lower[pos..].split_whitespace().skip(1).take(5) {
        if let Ok(secs) = word.trim_matches(|c: char| !c.is_numeric()).parse::<u64>() {
            if secs > 0 && secs < 300 {
                return Some(secs);
            }
        }
    }
    None
}

async fn call_chat(system: &str, user: &str) -> Result<String, OracleError> {
    let api_key = api_key().ok_or_else(|| {
        OracleError::Unavailable(
            "No API key configured. Run 'versecraft --setup' to get started.".to_string(),
        )
    })?;

    let client = reqwest::Client::new();
    let request = ChatRequest {
        model: MODEL.to_string(),
        messages: vec![
            Message {
                role: "system".to_string(),
                content: system.to_string(),
            },
            Message {
                role: "user".to_string(),
                content: user.to_string(),
            },
        ],
        max_tokens: MAX_TOKENS,
        stream: false,
    };

    let mut retry_count = 0;

    loop {
        let response = client
            .post(OPENROUTER_URL)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| OracleError::Network(e.to_string()))?;

        if status.is_success() {
            let parsed: ChatResponse = serde_json::from_str(&text)
                .map_err(|e| OracleError::Malformed(format!("chat envelope: {}", e)))?;
            return Ok(parsed
                .choices
                .first()
                .map(|c| c.message.content.clone())
                .unwrap_or_default());
        }

        if status.as_u16() == 429 && retry_count < MAX_RETRIES {
            retry_count += 1;
            let retry_after = parse_retry_after(&text).unwrap_or_else(|| {
                (INITIAL_BACKOFF_MS * BACKOFF_MULTIPLIER.pow(retry_count - 1)) / 1000
            });
            tokio::time::sleep(tokio::time::Duration::from_secs(retry_after)).await;
            continue;
        }

        return Err(match status.as_u16() {
            401 => OracleError::Unavailable(
                "Invalid API key. Run 'versecraft --setup' to update it.".to_string(),
            ),
            429 => OracleError::Unavailable(format!(
                "Rate limited after {} retries. Try again in a few minutes.",
                retry_count
            )),
            500..=599 => OracleError::Unavailable(format!(
                "Oracle server error ({}). The service may be temporarily overloaded.",
                status
            )),
            _ => OracleError::Network(format!("API error {}: {}", status, truncate(&text, 200))),
        });
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
