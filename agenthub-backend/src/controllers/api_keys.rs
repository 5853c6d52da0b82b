//! Per-agent API key management.
//!
//! Keys are stored as plaintext on the agent document and compared with plain
//! equality at chat time. Listings only ever expose masked previews.

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::models::mask_key;
use crate::AppState;

/// Services an agent can hold a key for. "chat" is the inbound key presented
/// by callers of the public chat endpoint; the rest are outbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ServiceId {
    Chat,
    Coingecko,
    Helius,
    Serper,
    Jina,
    Together,
    Fetchai,
    Elevenlabs,
}

#[derive(Debug, Deserialize)]
pub struct SetKeyRequest {
    pub service: String,
    pub key: String,
}

#[derive(Debug, Serialize)]
struct KeyListing {
    service: String,
    preview: String,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/agents/{id}/keys")
            .route(web::get().to(list_keys))
            .route(web::post().to(set_key)),
    )
    .service(web::resource("/api/agents/{id}/keys/{service}").route(web::delete().to(delete_key)));
}

fn db_error(e: rusqlite::Error) -> HttpResponse {
    log::error!("Database error: {}", e);
    HttpResponse::InternalServerError().json(json!({ "success": false, "error": "Database error" }))
}

fn unknown_service(service: &str) -> HttpResponse {
    let known: Vec<String> = ServiceId::iter().map(|s| s.to_string()).collect();
    HttpResponse::BadRequest().json(json!({
        "success": false,
        "error": format!("Unknown service '{}', expected one of: {}", service, known.join(", ")),
    }))
}

async fn set_key(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<SetKeyRequest>,
) -> impl Responder {
    let service = match ServiceId::from_str(&body.service) {
        Ok(s) => s,
        Err(_) => return unknown_service(&body.service),
    };
    if body.key.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "error": "Key cannot be empty" }));
    }

    match state
        .db
        .set_agent_api_key(&path, &service.to_string(), &body.key)
    {
        Ok(true) => HttpResponse::Ok().json(json!({ "success": true })),
        Ok(false) => {
            HttpResponse::NotFound().json(json!({ "success": false, "error": "Agent not found" }))
        }
        Err(e) => db_error(e),
    }
}

async fn list_keys(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.db.get_agent(&path) {
        Ok(Some(agent)) => {
            let mut keys: Vec<KeyListing> = agent
                .api_keys
                .iter()
                .map(|(service, value)| KeyListing {
                    service: service.clone(),
                    preview: mask_key(value),
                })
                .collect();
            keys.sort_by(|a, b| a.service.cmp(&b.service));
            HttpResponse::Ok().json(json!({ "keys": keys }))
        }
        Ok(None) => {
            HttpResponse::NotFound().json(json!({ "success": false, "error": "Agent not found" }))
        }
        Err(e) => db_error(e),
    }
}

async fn delete_key(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (agent_id, service) = path.into_inner();
    let service = match ServiceId::from_str(&service) {
        Ok(s) => s,
        Err(_) => return unknown_service(&service),
    };

    match state.db.delete_agent_api_key(&agent_id, &service.to_string()) {
        Ok(true) => HttpResponse::Ok().json(json!({ "success": true })),
        Ok(false) => HttpResponse::NotFound()
            .json(json!({ "success": false, "error": "Agent or key not found" })),
        Err(e) => db_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_names_parse_lowercase() {
        assert_eq!(ServiceId::from_str("chat").unwrap(), ServiceId::Chat);
        assert_eq!(ServiceId::from_str("helius").unwrap(), ServiceId::Helius);
        assert!(ServiceId::from_str("Chat").is_err());
        assert!(ServiceId::from_str("unknown").is_err());
        assert_eq!(ServiceId::Elevenlabs.to_string(), "elevenlabs");
    }
}
