//! Agent CRUD.
//!
//! Responses always go through [`AgentResponse`] so raw API keys never leave
//! the process.

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::controllers::owner_allows;
use crate::models::{AgentResponse, CreateAgentRequest, UpdateAgentRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListAgentsQuery {
    #[serde(default)]
    pub owner: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/agents")
            .route(web::get().to(list_agents))
            .route(web::post().to(create_agent)),
    )
    .service(
        web::resource("/api/agents/{id}")
            .route(web::get().to(get_agent))
            .route(web::put().to(update_agent))
            .route(web::delete().to(delete_agent)),
    );
}

fn db_error(e: rusqlite::Error) -> HttpResponse {
    log::error!("Database error: {}", e);
    HttpResponse::InternalServerError().json(json!({ "success": false, "error": "Database error" }))
}

async fn create_agent(
    state: web::Data<AppState>,
    body: web::Json<CreateAgentRequest>,
) -> impl Responder {
    if body.name.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "error": "Agent name cannot be empty" }));
    }

    // Capability refs must resolve before the agent is written.
    for cap_id in &body.capabilities {
        match state.db.get_capability(cap_id) {
            Ok(Some(_)) => {}
            Ok(None) => {
                return HttpResponse::BadRequest().json(json!({
                    "success": false,
                    "error": format!("Unknown capability: {}", cap_id),
                }));
            }
            Err(e) => return db_error(e),
        }
    }

    match state.db.create_agent(&body) {
        Ok(agent) => HttpResponse::Created().json(AgentResponse::from(agent)),
        Err(e) => db_error(e),
    }
}

async fn list_agents(
    state: web::Data<AppState>,
    query: web::Query<ListAgentsQuery>,
) -> impl Responder {
    match state.db.list_agents() {
        Ok(agents) => {
            let agents: Vec<AgentResponse> = agents
                .into_iter()
                .filter(|a| match &query.owner {
                    Some(owner) => a.owner_address.as_deref() == Some(owner.as_str()),
                    None => true,
                })
                .map(AgentResponse::from)
                .collect();
            HttpResponse::Ok().json(json!({ "agents": agents }))
        }
        Err(e) => db_error(e),
    }
}

async fn get_agent(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.db.get_agent(&path) {
        Ok(Some(agent)) => HttpResponse::Ok().json(AgentResponse::from(agent)),
        Ok(None) => {
            HttpResponse::NotFound().json(json!({ "success": false, "error": "Agent not found" }))
        }
        Err(e) => db_error(e),
    }
}

async fn update_agent(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
    body: web::Json<UpdateAgentRequest>,
) -> impl Responder {
    match state.db.get_agent(&path) {
        Ok(Some(agent)) => {
            if !owner_allows(&agent, &req) {
                return HttpResponse::Forbidden()
                    .json(json!({ "success": false, "error": "Not the agent owner" }));
            }
        }
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(json!({ "success": false, "error": "Agent not found" }));
        }
        Err(e) => return db_error(e),
    }

    if let Some(capabilities) = &body.capabilities {
        for cap_id in capabilities {
            match state.db.get_capability(cap_id) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    return HttpResponse::BadRequest().json(json!({
                        "success": false,
                        "error": format!("Unknown capability: {}", cap_id),
                    }));
                }
                Err(e) => return db_error(e),
            }
        }
    }

    match state.db.update_agent(&path, &body) {
        Ok(Some(agent)) => HttpResponse::Ok().json(AgentResponse::from(agent)),
        Ok(None) => {
            HttpResponse::NotFound().json(json!({ "success": false, "error": "Agent not found" }))
        }
        Err(e) => db_error(e),
    }
}

async fn delete_agent(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> impl Responder {
    match state.db.get_agent(&path) {
        Ok(Some(agent)) => {
            if !owner_allows(&agent, &req) {
                return HttpResponse::Forbidden()
                    .json(json!({ "success": false, "error": "Not the agent owner" }));
            }
        }
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(json!({ "success": false, "error": "Agent not found" }));
        }
        Err(e) => return db_error(e),
    }

    match state.db.delete_agent(&path) {
        Ok(true) => HttpResponse::Ok().json(json!({ "success": true })),
        Ok(false) => {
            HttpResponse::NotFound().json(json!({ "success": false, "error": "Agent not found" }))
        }
        Err(e) => db_error(e),
    }
}
