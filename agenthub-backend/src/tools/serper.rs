//! Serper proxy: general web search.

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::AppState;

const SEARCH_URL: &str = "https://google.serper.dev/search";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
    pub position: u32,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchResult>,
}

pub async fn web_search(
    client: &reqwest::Client,
    api_key: &str,
    query: &str,
    num: usize,
) -> Result<Vec<SearchResult>, String> {
    let resp = client
        .post(SEARCH_URL)
        .header("X-API-KEY", api_key)
        .timeout(Duration::from_secs(15))
        .json(&json!({ "q": query, "num": num }))
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !resp.status().is_success() {
        return Err(format!("API error: {}", resp.status()));
    }

    let data: SerperResponse = resp.json().await.map_err(|e| format!("Parse error: {}", e))?;
    Ok(data.organic)
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub q: String,
    #[serde(default = "default_num")]
    pub num: usize,
}

fn default_num() -> usize {
    5
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/tools/serper/search").route(web::post().to(search_handler)));
}

async fn search_handler(
    state: web::Data<AppState>,
    body: web::Json<SearchRequest>,
) -> impl Responder {
    let api_key = match &state.config.serper_api_key {
        Some(k) => k,
        None => {
            return HttpResponse::InternalServerError()
                .json(json!({ "success": false, "error": "Serper API key not configured" }));
        }
    };

    match web_search(&state.http, api_key, &body.q, body.num).await {
        Ok(results) => HttpResponse::Ok().json(json!({ "results": results })),
        Err(e) => {
            log::error!("Serper search failed: {}", e);
            HttpResponse::BadGateway().json(json!({ "success": false, "error": e }))
        }
    }
}
