//! Jina reader proxy: URL -> extracted page text.

use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::AppState;

const READER_URL: &str = "https://r.jina.ai";

pub async fn read_url(
    client: &reqwest::Client,
    api_key: Option<&str>,
    url: &str,
) -> Result<String, String> {
    let mut req = client
        .get(format!("{}/{}", READER_URL, url))
        .timeout(Duration::from_secs(30));
    if let Some(key) = api_key {
        req = req.bearer_auth(key);
    }

    let resp = req.send().await.map_err(|e| format!("Request failed: {}", e))?;
    if !resp.status().is_success() {
        return Err(format!("API error: {}", resp.status()));
    }

    resp.text().await.map_err(|e| format!("Read error: {}", e))
}

#[derive(Debug, Deserialize)]
pub struct ReadRequest {
    pub url: String,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/tools/jina/read").route(web::post().to(read_handler)));
}

async fn read_handler(state: web::Data<AppState>, body: web::Json<ReadRequest>) -> impl Responder {
    match read_url(&state.http, state.config.jina_api_key.as_deref(), &body.url).await {
        Ok(content) => HttpResponse::Ok().json(json!({ "content": content })),
        Err(e) => {
            log::error!("Jina read failed for {}: {}", body.url, e);
            HttpResponse::BadGateway().json(json!({ "success": false, "error": e }))
        }
    }
}
