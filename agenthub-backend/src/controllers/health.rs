use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health)))
        .service(web::resource("/api/version").route(web::get().to(version)))
        .service(web::resource("/api/health/config").route(web::get().to(config_check)));
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

async fn version() -> impl Responder {
    HttpResponse::Ok().json(json!({ "version": env!("CARGO_PKG_VERSION") }))
}

/// Reports which external services have keys configured, never the keys.
async fn config_check(state: web::Data<AppState>) -> impl Responder {
    let c = &state.config;
    HttpResponse::Ok().json(json!({
        "coingecko": c.coingecko_api_key.is_some(),
        "helius": c.helius_api_key.is_some(),
        "serper": c.serper_api_key.is_some(),
        "jina": c.jina_api_key.is_some(),
        "together": c.together_api_key.is_some(),
        "fetchai": c.fetchai_api_key.is_some(),
        "elevenlabs": c.elevenlabs_api_key.is_some(),
        "mistral": c.mistral_api_key.is_some(),
        "verify": c.verify_program_id.is_some() && c.verify_signer_key.is_some(),
    }))
}
