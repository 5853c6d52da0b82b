//! ASI-1 (FetchAI) proxy: the completion endpoint used for the final
//! assistant reply. Reasoning models wrap their rationale in a `<think>`
//! block; it is split out and passed through as `thought`.

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::AppState;

const CHAT_URL: &str = "https://api.asi1.ai/v1/chat/completions";
const COMPLETION_MODEL: &str = "asi1-mini";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub completion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    pub model: String,
    pub usage: Usage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Split a leading `<think>...</think>` block from the reply body.
fn split_think(content: &str) -> (Option<String>, String) {
    let trimmed = content.trim_start();
    if let Some(rest) = trimmed.strip_prefix("<think>") {
        if let Some(end) = rest.find("</think>") {
            let thought = rest[..end].trim().to_string();
            let body = rest[end + "</think>".len()..].trim().to_string();
            let thought = if thought.is_empty() { None } else { Some(thought) };
            return (thought, body);
        }
    }
    (None, content.trim().to_string())
}

pub async fn complete(
    client: &reqwest::Client,
    api_key: &str,
    prompt: &str,
    system_instruction: &str,
    temperature: f64,
    max_tokens: u32,
) -> Result<Completion, String> {
    let resp = client
        .post(CHAT_URL)
        .bearer_auth(api_key)
        .timeout(Duration::from_secs(60))
        .json(&json!({
            "model": COMPLETION_MODEL,
            "messages": [
                { "role": "system", "content": system_instruction },
                { "role": "user", "content": prompt },
            ],
            "temperature": temperature,
            "max_tokens": max_tokens,
        }))
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !resp.status().is_success() {
        return Err(format!("API error: {}", resp.status()));
    }

    let data: ChatCompletionResponse =
        resp.json().await.map_err(|e| format!("Parse error: {}", e))?;
    let content = data
        .choices
        .first()
        .map(|c| c.message.content.clone())
        .ok_or_else(|| "Empty completion".to_string())?;

    let (thought, completion) = split_think(&content);
    Ok(Completion {
        completion,
        thought,
        model: data.model.unwrap_or_else(|| COMPLETION_MODEL.to_string()),
        usage: data.usage.unwrap_or_default(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub prompt: String,
    #[serde(default)]
    pub system_instruction: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/tools/fetchai/completion").route(web::post().to(completion_handler)),
    );
}

async fn completion_handler(
    state: web::Data<AppState>,
    body: web::Json<CompletionRequest>,
) -> impl Responder {
    let api_key = match &state.config.fetchai_api_key {
        Some(k) => k,
        None => {
            return HttpResponse::InternalServerError()
                .json(json!({ "success": false, "error": "ASI-1 API key not configured" }));
        }
    };

    match complete(
        &state.http,
        api_key,
        &body.prompt,
        &body.system_instruction,
        body.temperature,
        body.max_tokens,
    )
    .await
    {
        Ok(completion) => HttpResponse::Ok().json(completion),
        Err(e) => {
            log::error!("Completion failed: {}", e);
            HttpResponse::BadGateway().json(json!({ "success": false, "error": e }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_think_block() {
        let (thought, body) = split_think("<think>user wants a price</think>SOL is at $150.");
        assert_eq!(thought.as_deref(), Some("user wants a price"));
        assert_eq!(body, "SOL is at $150.");
    }

    #[test]
    fn passes_through_plain_content() {
        let (thought, body) = split_think("  Just an answer.  ");
        assert!(thought.is_none());
        assert_eq!(body, "Just an answer.");
    }

    #[test]
    fn unterminated_think_is_left_alone() {
        let (thought, body) = split_think("<think>never closed");
        assert!(thought.is_none());
        assert_eq!(body, "<think>never closed");
    }
}
