use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::config;

#[derive(Debug, Deserialize)]
pub struct AdminCheckQuery {
    pub address: String,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/admin/check").route(web::get().to(check)));
}

/// Constant-set membership test over the admin allowlist.
async fn check(query: web::Query<AdminCheckQuery>) -> impl Responder {
    HttpResponse::Ok().json(json!({ "admin": config::is_admin(&query.address) }))
}
