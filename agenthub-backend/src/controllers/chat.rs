//! Authenticated chat endpoint.
//!
//! Callers present the agent's "chat" key in `X-Api-Key`; comparison is plain
//! string equality against the stored value. A successful turn appends one
//! usage-log row.

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::orchestrator::{self, HttpToolClient, TurnRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub connected_wallet: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/chat/{agent_id}").route(web::post().to(chat)));
}

async fn chat(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
    body: web::Json<ChatRequest>,
) -> impl Responder {
    if body.message.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "error": "Message cannot be empty" }));
    }

    let agent = match state.db.get_agent(&path) {
        Ok(Some(agent)) => agent,
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(json!({ "success": false, "error": "Agent not found" }));
        }
        Err(e) => {
            log::error!("Database error: {}", e);
            return HttpResponse::InternalServerError()
                .json(json!({ "success": false, "error": "Database error" }));
        }
    };

    let presented = req
        .headers()
        .get("X-Api-Key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !agent.chat_key_matches(presented) {
        return HttpResponse::Unauthorized()
            .json(json!({ "success": false, "error": "Invalid API key" }));
    }

    // Capability ids -> names; dangling refs are dropped rather than failing
    // the turn.
    let mut capability_names = Vec::with_capacity(agent.capabilities.len());
    for cap_id in &agent.capabilities {
        match state.db.get_capability(cap_id) {
            Ok(Some(cap)) => capability_names.push(cap.name),
            Ok(None) => log::warn!("Agent {} references missing capability {}", agent.id, cap_id),
            Err(e) => log::error!("Database error resolving capability {}: {}", cap_id, e),
        }
    }

    let turn = TurnRequest {
        message: body.message.clone(),
        agent_name: agent.name.clone(),
        system_instructions: agent.system_instructions.clone(),
        capabilities: capability_names,
        connected_wallet: body.connected_wallet.clone(),
    };

    let tools = HttpToolClient::new(
        state.db.clone(),
        state.config.clone(),
        state.http.clone(),
    );
    let message = orchestrator::run_turn(&tools, &turn).await;

    if let Err(e) = state.db.record_usage(&agent.id, &format!("/api/chat/{}", agent.id)) {
        log::warn!("Failed to record usage for {}: {}", agent.id, e);
    }

    HttpResponse::Ok().json(message)
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

    fn state_with_agent() -> (web::Data<AppState>, String) {
        let db = Arc::new(Database::new(":memory:").unwrap());
        let agent = db
            .create_agent(&CreateAgentRequest {
                name: "support-bot".to_string(),
                description: String::new(),
                system_instructions: "Be brief.".to_string(),
                agent_type: None,
                capabilities: vec![],
                owner_address: None,
            })
            .unwrap();
        db.set_agent_api_key(&agent.id, "chat", "sekret-key").unwrap();

        let state = web::Data::new(AppState {
            db,
            config: Config::for_tests(),
            http: reqwest::Client::new(),
        });
        (state, agent.id)
    }

    #[actix_web::test]
    async fn wrong_api_key_is_rejected() {
        let (state, agent_id) = state_with_agent();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/chat/{}", agent_id))
                .insert_header(("X-Api-Key", "wrong"))
                .set_json(serde_json::json!({ "message": "hi" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn authorized_turn_degrades_without_completion_backend() {
        let (state, agent_id) = state_with_agent();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        // No completion key is configured, so the pipeline runs all the way
        // to the fatal completion stage and synthesizes the apology message.
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/chat/{}", agent_id))
                .insert_header(("X-Api-Key", "sekret-key"))
                .set_json(serde_json::json!({ "message": "hello there" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["role"], "assistant");
        assert_eq!(body["error"], true);

        assert_eq!(state.db.usage_count(&agent_id).unwrap(), 1);
    }
}
