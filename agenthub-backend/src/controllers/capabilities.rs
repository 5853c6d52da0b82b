//! Capability CRUD.
//!
//! `description` is embedded on every write so vector matching stays in sync.
//! A capability cannot be deleted while any agent references it.

use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::embedding;
use crate::models::{CapabilityResponse, CreateCapabilityRequest, UpdateCapabilityRequest};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/capabilities")
            .route(web::get().to(list_capabilities))
            .route(web::post().to(create_capability)),
    )
    .service(
        web::resource("/api/capabilities/{id}")
            .route(web::get().to(get_capability))
            .route(web::put().to(update_capability))
            .route(web::delete().to(delete_capability)),
    );
}

fn db_error(e: rusqlite::Error) -> HttpResponse {
    log::error!("Database error: {}", e);
    HttpResponse::InternalServerError().json(json!({ "success": false, "error": "Database error" }))
}

async fn create_capability(
    state: web::Data<AppState>,
    body: web::Json<CreateCapabilityRequest>,
) -> impl Responder {
    if body.name.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "error": "Capability name cannot be empty" }));
    }

    match state.db.get_capability_by_name(&body.name) {
        Ok(Some(_)) => {
            return HttpResponse::Conflict().json(json!({
                "success": false,
                "error": format!("Capability '{}' already exists", body.name),
            }));
        }
        Ok(None) => {}
        Err(e) => return db_error(e),
    }

    let vector = embedding::embed(&state.http, &state.config, &body.description).await;
    match state.db.create_capability(&body, &vector) {
        Ok(cap) => HttpResponse::Created().json(CapabilityResponse::from(cap)),
        Err(e) => db_error(e),
    }
}

async fn list_capabilities(state: web::Data<AppState>) -> impl Responder {
    match state.db.list_capabilities() {
        Ok(caps) => {
            let caps: Vec<CapabilityResponse> =
                caps.into_iter().map(CapabilityResponse::from).collect();
            HttpResponse::Ok().json(json!({ "capabilities": caps }))
        }
        Err(e) => db_error(e),
    }
}

async fn get_capability(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.db.get_capability(&path) {
        Ok(Some(cap)) => HttpResponse::Ok().json(CapabilityResponse::from(cap)),
        Ok(None) => HttpResponse::NotFound()
            .json(json!({ "success": false, "error": "Capability not found" })),
        Err(e) => db_error(e),
    }
}

async fn update_capability(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateCapabilityRequest>,
) -> impl Responder {
    // Re-embed only when the description actually changes.
    let vector = match &body.description {
        Some(description) => Some(embedding::embed(&state.http, &state.config, description).await),
        None => None,
    };

    match state.db.update_capability(&path, &body, vector.as_deref()) {
        Ok(Some(cap)) => HttpResponse::Ok().json(CapabilityResponse::from(cap)),
        Ok(None) => HttpResponse::NotFound()
            .json(json!({ "success": false, "error": "Capability not found" })),
        Err(e) => db_error(e),
    }
}

async fn delete_capability(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let referencing = match state.db.count_agents_referencing(&path) {
        Ok(n) => n,
        Err(e) => return db_error(e),
    };
    if referencing > 0 {
        return HttpResponse::Conflict().json(json!({
            "success": false,
            "error": format!("Capability is referenced by {} agent(s)", referencing),
        }));
    }

    match state.db.delete_capability(&path) {
        Ok(true) => HttpResponse::Ok().json(json!({ "success": true })),
        Ok(false) => HttpResponse::NotFound()
            .json(json!({ "success": false, "error": "Capability not found" })),
        Err(e) => db_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::Database;
    use crate::models::CreateAgentRequest;
    use crate::AppState;
    use actix_web::{http::StatusCode, test, App};
    use std::sync::Arc;

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState {
            db: Arc::new(Database::new(":memory:").unwrap()),
            config: Config::for_tests(),
            http: reqwest::Client::new(),
        })
    }

    #[actix_web::test]
    async fn duplicate_name_conflicts() {
        let state = state();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let body = serde_json::json!({ "name": "Web Search", "description": "search" });
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/capabilities")
                .set_json(&body)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/capabilities")
                .set_json(&body)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn delete_blocked_while_referenced() {
        let state = state();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let cap = state
            .db
            .create_capability(
                &CreateCapabilityRequest {
                    name: "Price Tracking".to_string(),
                    description: "track prices".to_string(),
                    capability_type: None,
                    parameters: vec![],
                    api_endpoint: None,
                },
                &[],
            )
            .unwrap();
        state
            .db
            .create_agent(&CreateAgentRequest {
                name: "holder".to_string(),
                description: String::new(),
                system_instructions: String::new(),
                agent_type: None,
                capabilities: vec![cap.id.clone()],
                owner_address: None,
            })
            .unwrap();

        let resp = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&format!("/api/capabilities/{}", cap.id))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        assert!(state.db.delete_agent(&state.db.list_agents().unwrap()[0].id).unwrap());
        let resp = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&format!("/api/capabilities/{}", cap.id))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
