//! Helius proxy: wallet portfolio (DAS) and recent transaction history.

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::AppState;

const RPC_URL: &str = "https://mainnet.helius-rpc.com";
const ENHANCED_API_URL: &str = "https://api.helius.xyz/v0";

const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    /// Native balance in SOL
    pub sol_balance: f64,
    /// Names of held assets, DAS ordering
    pub assets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxSummary {
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<String>,
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL
}

/// Fetch SOL balance and held assets via DAS `getAssetsByOwner`.
pub async fn wallet_portfolio(
    client: &reqwest::Client,
    api_key: &str,
    address: &str,
) -> Result<Portfolio, String> {
    let url = format!("{}/?api-key={}", RPC_URL, api_key);
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "getAssetsByOwner",
        "params": {
            "ownerAddress": address,
            "page": 1,
            "limit": 50,
            "displayOptions": { "showNativeBalance": true }
        }
    });

    let resp = client
        .post(&url)
        .timeout(Duration::from_secs(20))
        .json(&request)
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !resp.status().is_success() {
        return Err(format!("API error: {}", resp.status()));
    }

    let body: Value = resp.json().await.map_err(|e| format!("Parse error: {}", e))?;
    if let Some(error) = body.get("error") {
        return Err(format!("RPC error: {}", error));
    }
    let result = body
        .get("result")
        .ok_or_else(|| "Missing result".to_string())?;

    let lamports = result
        .get("nativeBalance")
        .and_then(|n| n.get("lamports"))
        .and_then(|l| l.as_u64())
        .unwrap_or(0);

    let assets = result
        .get("items")
        .and_then(|i| i.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.get("content")
                        .and_then(|c| c.get("metadata"))
                        .and_then(|m| m.get("name"))
                        .and_then(|n| n.as_str())
                        .map(|s| s.to_string())
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Portfolio {
        sol_balance: lamports_to_sol(lamports),
        assets,
    })
}

/// Recent enhanced transactions for an address, newest first.
pub async fn recent_transactions(
    client: &reqwest::Client,
    api_key: &str,
    address: &str,
) -> Result<Vec<TxSummary>, String> {
    let url = format!(
        "{}/addresses/{}/transactions?api-key={}",
        ENHANCED_API_URL,
        urlencoding::encode(address),
        api_key
    );

    let resp = client
        .get(&url)
        .timeout(Duration::from_secs(20))
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !resp.status().is_success() {
        return Err(format!("API error: {}", resp.status()));
    }

    let body: Vec<Value> = resp.json().await.map_err(|e| format!("Parse error: {}", e))?;
    Ok(body
        .into_iter()
        .filter_map(|tx| {
            let timestamp = tx.get("timestamp").and_then(|t| t.as_i64())?;
            Some(TxSummary {
                timestamp,
                signature: tx
                    .get("signature")
                    .and_then(|s| s.as_str())
                    .map(|s| s.to_string()),
                tx_type: tx
                    .get("type")
                    .and_then(|s| s.as_str())
                    .map(|s| s.to_string()),
            })
        })
        .collect())
}

#[derive(Debug, Deserialize)]
pub struct AddressQuery {
    pub address: String,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/tools/helius/portfolio").route(web::get().to(portfolio_handler)),
    )
    .service(
        web::resource("/api/tools/helius/transaction").route(web::get().to(transactions_handler)),
    );
}

async fn portfolio_handler(
    state: web::Data<AppState>,
    query: web::Query<AddressQuery>,
) -> impl Responder {
    let api_key = match &state.config.helius_api_key {
        Some(k) => k,
        None => {
            return HttpResponse::InternalServerError()
                .json(json!({ "success": false, "error": "Helius API key not configured" }));
        }
    };

    match wallet_portfolio(&state.http, api_key, &query.address).await {
        Ok(portfolio) => HttpResponse::Ok().json(json!({
            "portfolio": {
                "nativeBalance": { "sol": portfolio.sol_balance },
                "assets": portfolio.assets,
            }
        })),
        Err(e) => {
            log::error!("Helius portfolio failed: {}", e);
            HttpResponse::BadGateway().json(json!({ "success": false, "error": e }))
        }
    }
}

async fn transactions_handler(
    state: web::Data<AppState>,
    query: web::Query<AddressQuery>,
) -> impl Responder {
    let api_key = match &state.config.helius_api_key {
        Some(k) => k,
        None => {
            return HttpResponse::InternalServerError()
                .json(json!({ "success": false, "error": "Helius API key not configured" }));
        }
    };

    match recent_transactions(&state.http, api_key, &query.address).await {
        Ok(txs) => HttpResponse::Ok().json(txs),
        Err(e) => {
            log::error!("Helius transactions failed: {}", e);
            HttpResponse::BadGateway().json(json!({ "success": false, "error": e }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lamports_conversion() {
        assert_eq!(lamports_to_sol(2_500_000_000), 2.5);
        assert_eq!(lamports_to_sol(0), 0.0);
    }
}
