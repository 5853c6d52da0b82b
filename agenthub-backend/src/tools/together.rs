//! Together proxy: message intent classification.
//!
//! The classifier asks an instruct model for strict JSON and parses it
//! defensively; any failure surfaces as an Err so the caller can fall back to
//! the default intent.

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::AppState;

const CHAT_URL: &str = "https://api.together.xyz/v1/chat/completions";
const CLASSIFIER_MODEL: &str = "meta-llama/Llama-3.3-70B-Instruct-Turbo";

pub const INTENT_TOKEN_PRICE: &str = "token_price";
pub const INTENT_WALLET_ANALYSIS: &str = "wallet_analysis";
pub const INTENT_CUSTOMER_SUPPORT: &str = "customer_support";

const CLASSIFIER_PROMPT: &str = "You classify a user message for a crypto assistant. \
Reply with ONLY a JSON object, no prose, of the form \
{\"primaryIntent\": \"token_price\" | \"wallet_analysis\" | \"customer_support\", \
\"confidence\": <0..1>, \"searchQuery\": <optional refined query string>}. \
Use token_price for price/market questions, wallet_analysis for questions about a \
wallet address or its holdings/transactions, customer_support for everything else.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentData {
    pub primary_intent: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
}

impl IntentData {
    pub fn default_intent() -> Self {
        Self {
            primary_intent: INTENT_CUSTOMER_SUPPORT.to_string(),
            confidence: 0.0,
            search_query: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Strip a surrounding markdown code fence, if present.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

fn parse_intent(content: &str) -> Result<IntentData, String> {
    let intent: IntentData = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| format!("Unparsable intent JSON: {}", e))?;
    match intent.primary_intent.as_str() {
        INTENT_TOKEN_PRICE | INTENT_WALLET_ANALYSIS | INTENT_CUSTOMER_SUPPORT => Ok(intent),
        other => Err(format!("Unknown intent '{}'", other)),
    }
}

pub async fn classify_intent(
    client: &reqwest::Client,
    api_key: &str,
    query: &str,
) -> Result<IntentData, String> {
    let resp = client
        .post(CHAT_URL)
        .bearer_auth(api_key)
        .timeout(Duration::from_secs(30))
        .json(&json!({
            "model": CLASSIFIER_MODEL,
            "messages": [
                { "role": "system", "content": CLASSIFIER_PROMPT },
                { "role": "user", "content": query },
            ],
            "temperature": 0.0,
            "max_tokens": 200,
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
        .map(|c| c.message.content.as_str())
        .ok_or_else(|| "Empty completion".to_string())?;

    parse_intent(content)
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub query: String,
    #[serde(default, rename = "intentClassification")]
    pub intent_classification: bool,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/tools/together").route(web::post().to(classify_handler)));
}

async fn classify_handler(
    state: web::Data<AppState>,
    body: web::Json<ClassifyRequest>,
) -> impl Responder {
    if !body.intent_classification {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "error": "intentClassification must be true" }));
    }

    let api_key = match &state.config.together_api_key {
        Some(k) => k,
        None => {
            return HttpResponse::InternalServerError()
                .json(json!({ "success": false, "error": "Together API key not configured" }));
        }
    };

    match classify_intent(&state.http, api_key, &body.query).await {
        Ok(intent) => HttpResponse::Ok().json(json!({ "intent": intent })),
        Err(e) => {
            // Classification is best-effort: surface the default intent
            // rather than an error, matching the pipeline contract.
            log::warn!("Intent classification failed: {}", e);
            HttpResponse::Ok().json(json!({ "intent": IntentData::default_intent() }))
        }
    }
}
