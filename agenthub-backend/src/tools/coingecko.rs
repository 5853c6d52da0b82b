//! CoinGecko proxy: token search and market detail.
//!
//! The detail fetch retries HTTP 429 with exponential backoff. That backoff is
//! local to this proxy; the chat pipeline itself never retries.

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::AppState;

const BASE_URL: &str = "https://api.coingecko.com/api/v3";
const MAX_429_RETRIES: u32 = 3;
const BACKOFF_BASE_MS: u64 = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSearchResult {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
}

/// Flattened market data for one token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDetail {
    pub current_price_usd: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub ath_usd: Option<f64>,
    pub market_cap_usd: Option<f64>,
    pub volume_24h_usd: Option<f64>,
    pub image: Option<String>,
}

// Minimal response types - just what we need
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchCoin>,
}

#[derive(Debug, Deserialize)]
struct SearchCoin {
    id: String,
    name: String,
    symbol: String,
    large: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoinResponse {
    #[serde(default)]
    market_data: Option<MarketData>,
    image: Option<CoinImage>,
}

#[derive(Debug, Deserialize)]
struct CoinImage {
    large: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MarketData {
    current_price: Option<UsdQuote>,
    price_change_percentage_24h: Option<f64>,
    ath: Option<UsdQuote>,
    market_cap: Option<UsdQuote>,
    total_volume: Option<UsdQuote>,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    usd: Option<f64>,
}

fn with_key(req: reqwest::RequestBuilder, api_key: Option<&str>) -> reqwest::RequestBuilder {
    match api_key {
        Some(key) => req.header("x-cg-demo-api-key", key),
        None => req,
    }
}

pub async fn search_tokens(
    client: &reqwest::Client,
    api_key: Option<&str>,
    query: &str,
    limit: usize,
) -> Result<Vec<TokenSearchResult>, String> {
    let url = format!("{}/search?query={}", BASE_URL, urlencoding::encode(query));

    let resp = with_key(client.get(&url), api_key)
        .timeout(Duration::from_secs(15))
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !resp.status().is_success() {
        return Err(format!("API error: {}", resp.status()));
    }

    let data: SearchResponse = resp.json().await.map_err(|e| format!("Parse error: {}", e))?;
    Ok(data
        .coins
        .into_iter()
        .take(limit)
        .map(|c| TokenSearchResult {
            id: c.id,
            name: c.name,
            symbol: c.symbol.to_lowercase(),
            description: None,
            image: c.large,
            contract_address: None,
        })
        .collect())
}

/// Fetch market data for one token id, retrying 429s with exponential backoff.
pub async fn token_detail(
    client: &reqwest::Client,
    api_key: Option<&str>,
    id: &str,
) -> Result<TokenDetail, String> {
    let url = format!(
        "{}/coins/{}?localization=false&tickers=false&market_data=true&community_data=false&developer_data=false",
        BASE_URL,
        urlencoding::encode(id)
    );

    let mut attempt = 0u32;
    let resp = loop {
        let resp = with_key(client.get(&url), api_key)
            .timeout(Duration::from_secs(15))
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        if resp.status().as_u16() == 429 && attempt < MAX_429_RETRIES {
            let delay = BACKOFF_BASE_MS * 2u64.pow(attempt);
            log::warn!("CoinGecko rate limited, retrying in {}ms", delay);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            attempt += 1;
            continue;
        }
        break resp;
    };

    if !resp.status().is_success() {
        return Err(format!("API error: {}", resp.status()));
    }

    let data: CoinResponse = resp.json().await.map_err(|e| format!("Parse error: {}", e))?;
    let market = data.market_data.ok_or_else(|| "No market data".to_string())?;

    Ok(TokenDetail {
        current_price_usd: market.current_price.and_then(|q| q.usd),
        price_change_24h: market.price_change_percentage_24h,
        ath_usd: market.ath.and_then(|q| q.usd),
        market_cap_usd: market.market_cap.and_then(|q| q.usd),
        volume_24h_usd: market.total_volume.and_then(|q| q.usd),
        image: data.image.and_then(|i| i.large),
    })
}

#[derive(Debug, Deserialize)]
pub struct TokenSearchQuery {
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    5
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/tools/coingecko/token").route(web::get().to(search_handler)))
        .service(
            web::resource("/api/tools/coingecko/token/{id}").route(web::get().to(detail_handler)),
        );
}

async fn search_handler(
    state: web::Data<AppState>,
    query: web::Query<TokenSearchQuery>,
) -> impl Responder {
    match search_tokens(
        &state.http,
        state.config.coingecko_api_key.as_deref(),
        &query.query,
        query.limit,
    )
    .await
    {
        Ok(tokens) => HttpResponse::Ok().json(json!({ "tokens": tokens })),
        Err(e) => {
            log::error!("CoinGecko search failed: {}", e);
            HttpResponse::BadGateway().json(json!({ "success": false, "error": e }))
        }
    }
}

async fn detail_handler(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match token_detail(&state.http, state.config.coingecko_api_key.as_deref(), &id).await {
        Ok(detail) => HttpResponse::Ok().json(json!({
            "data": {
                "market_data": {
                    "current_price": { "usd": detail.current_price_usd },
                    "price_change_percentage_24h": detail.price_change_24h,
                    "ath": { "usd": detail.ath_usd },
                    "market_cap": { "usd": detail.market_cap_usd },
                    "total_volume": { "usd": detail.volume_24h_usd },
                },
                "image": { "large": detail.image },
            }
        })),
        Err(e) => {
            log::error!("CoinGecko detail failed for {}: {}", id, e);
            HttpResponse::BadGateway().json(json!({ "success": false, "error": e }))
        }
    }
}
