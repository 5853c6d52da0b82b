//! HTTP surface over the on-chain verification helper.

use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use solana_sdk::{pubkey::Pubkey, signature::Keypair};

use crate::{verify, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub content_hash: String,
    #[serde(default = "default_model_ref")]
    pub model_ref: String,
}

fn default_model_ref() -> String {
    "asi1-mini".to_string()
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/verify").route(web::post().to(register)))
        .service(web::resource("/api/verify/{hash}/confirm").route(web::post().to(confirm)))
        .service(web::resource("/api/verify/{hash}").route(web::get().to(fetch)));
}

fn verify_config(state: &AppState) -> Result<(Pubkey, Keypair), HttpResponse> {
    let program_id = state
        .config
        .verify_program_id
        .as_deref()
        .ok_or_else(not_configured)?;
    let signer_key = state
        .config
        .verify_signer_key
        .as_deref()
        .ok_or_else(not_configured)?;

    let program_id = verify::parse_program_id(program_id).map_err(bad_config)?;
    let signer = verify::parse_signer(signer_key).map_err(bad_config)?;
    Ok((program_id, signer))
}

fn not_configured() -> HttpResponse {
    HttpResponse::InternalServerError()
        .json(json!({ "success": false, "error": "Verification program not configured" }))
}

fn bad_config(e: String) -> HttpResponse {
    log::error!("Verification config invalid: {}", e);
    HttpResponse::InternalServerError().json(json!({ "success": false, "error": e }))
}

async fn register(state: web::Data<AppState>, body: web::Json<RegisterRequest>) -> impl Responder {
    let (program_id, signer) = match verify_config(&state) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let hash = match verify::parse_content_hash(&body.content_hash) {
        Ok(h) => h,
        Err(e) => return HttpResponse::BadRequest().json(json!({ "success": false, "error": e })),
    };

    match verify::register_content(
        &state.http,
        &state.config.solana_rpc_url,
        &program_id,
        &signer,
        &hash,
        &body.model_ref,
    )
    .await
    {
        Ok(signature) => {
            HttpResponse::Ok().json(json!({ "success": true, "signature": signature }))
        }
        Err(e) => {
            log::error!("Content registration failed: {}", e);
            HttpResponse::BadGateway().json(json!({ "success": false, "error": e }))
        }
    }
}

async fn confirm(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let (program_id, signer) = match verify_config(&state) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let hash = match verify::parse_content_hash(&path) {
        Ok(h) => h,
        Err(e) => return HttpResponse::BadRequest().json(json!({ "success": false, "error": e })),
    };

    match verify::verify_content(
        &state.http,
        &state.config.solana_rpc_url,
        &program_id,
        &signer,
        &hash,
    )
    .await
    {
        Ok(signature) => {
            HttpResponse::Ok().json(json!({ "success": true, "signature": signature }))
        }
        Err(e) => {
            log::error!("Content verification failed: {}", e);
            HttpResponse::BadGateway().json(json!({ "success": false, "error": e }))
        }
    }
}

async fn fetch(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let program_id = match state.config.verify_program_id.as_deref() {
        Some(id) => match verify::parse_program_id(id) {
            Ok(p) => p,
            Err(e) => return bad_config(e),
        },
        None => return not_configured(),
    };
    let hash = match verify::parse_content_hash(&path) {
        Ok(h) => h,
        Err(e) => return HttpResponse::BadRequest().json(json!({ "success": false, "error": e })),
    };

    match verify::fetch_record(&state.http, &state.config.solana_rpc_url, &program_id, &hash).await
    {
        Ok(Some(record)) => HttpResponse::Ok().json(json!({ "record": record })),
        Ok(None) => {
            HttpResponse::NotFound().json(json!({ "success": false, "error": "Record not found" }))
        }
        Err(e) => {
            log::error!("Record fetch failed: {}", e);
            HttpResponse::BadGateway().json(json!({ "success": false, "error": e }))
        }
    }
}
