//! Knowledge base: ingestion, listing, and search.
//!
//! Entries arrive either as inline text or as a URL run through the OCR
//! extractor. URL-sourced entries get a content hash and, when the on-chain
//! verification program is configured, a best-effort registration whose
//! signature is stored alongside the entry.

use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::db::Database;
use crate::models::{CreateKnowledgeRequest, VerificationInfo};
use crate::orchestrator::KnowledgeResult;
use crate::{embedding, ocr, verify, AppState};

#[derive(Debug, Deserialize)]
pub struct ListKnowledgeQuery {
    #[serde(default)]
    pub agent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchKnowledgeRequest {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

fn default_search_limit() -> usize {
    3
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/knowledge")
            .route(web::get().to(list_entries))
            .route(web::post().to(create_entry)),
    )
    // Literal path must register ahead of the id matcher.
    .service(web::resource("/api/knowledge/search").route(web::post().to(search_handler)))
    .service(web::resource("/api/knowledge/{id}").route(web::delete().to(delete_entry)));
}

fn db_error(e: rusqlite::Error) -> HttpResponse {
    log::error!("Database error: {}", e);
    HttpResponse::InternalServerError().json(json!({ "success": false, "error": "Database error" }))
}

/// Vector search over stored embeddings, falling back to plain text matching
/// when no entry carries an embedding. Shared by the HTTP endpoint and the
/// chat pipeline's knowledge stage.
pub async fn search_entries(
    db: &Database,
    http: &reqwest::Client,
    config: &Config,
    query: &str,
    limit: usize,
) -> Result<Vec<KnowledgeResult>, String> {
    let entries = db
        .list_knowledge(None)
        .map_err(|e| format!("Database error: {}", e))?;

    let embedded: Vec<_> = entries
        .iter()
        .filter(|e| !e.embedding.is_empty())
        .collect();

    if embedded.is_empty() {
        let hits = db
            .search_knowledge_text(query, limit)
            .map_err(|e| format!("Database error: {}", e))?;
        return Ok(hits
            .into_iter()
            .map(|e| KnowledgeResult {
                title: e.title,
                content: e.content,
                score: 0.0,
            })
            .collect());
    }

    let query_vector = embedding::embed(http, config, query).await;
    let mut scored: Vec<KnowledgeResult> = embedded
        .into_iter()
        .map(|e| KnowledgeResult {
            title: e.title.clone(),
            content: e.content.clone(),
            score: embedding::cosine_similarity(&query_vector, &e.embedding) as f64,
        })
        .collect();
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    Ok(scored)
}

async fn create_entry(
    state: web::Data<AppState>,
    body: web::Json<CreateKnowledgeRequest>,
) -> impl Responder {
    match state.db.get_agent(&body.agent_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(json!({ "success": false, "error": "Agent not found" }));
        }
        Err(e) => return db_error(e),
    }

    let (title, content, file_type, verification) = match (&body.content, &body.source_url) {
        (Some(content), None) => {
            if content.trim().is_empty() {
                return HttpResponse::BadRequest()
                    .json(json!({ "success": false, "error": "Content cannot be empty" }));
            }
            let title = body
                .title
                .clone()
                .unwrap_or_else(|| "Untitled".to_string());
            (title, content.clone(), body.file_type.clone(), None)
        }
        (None, Some(url)) => {
            let api_key = match &state.config.mistral_api_key {
                Some(k) => k,
                None => {
                    return HttpResponse::InternalServerError().json(
                        json!({ "success": false, "error": "OCR API key not configured" }),
                    );
                }
            };
            let doc = match ocr::extract_url(&state.http, api_key, url).await {
                Ok(doc) => doc,
                Err(e) => {
                    log::error!("OCR extraction failed for {}: {}", url, e);
                    return HttpResponse::BadGateway()
                        .json(json!({ "success": false, "error": e }));
                }
            };

            let content_hash = ocr::content_hash(&doc.content);
            let signature = register_on_chain(&state, &content_hash).await;
            let verification = VerificationInfo {
                content_hash,
                signature,
                verified: false,
            };
            let title = body.title.clone().unwrap_or(doc.title);
            (title, doc.content, Some("url".to_string()), Some(verification))
        }
        _ => {
            return HttpResponse::BadRequest().json(json!({
                "success": false,
                "error": "Provide exactly one of content or source_url",
            }));
        }
    };

    let vector = embedding::embed(&state.http, &state.config, &content).await;
    match state.db.create_knowledge(
        &body.agent_id,
        &title,
        &content,
        &vector,
        file_type.as_deref(),
        body.source_url.as_deref(),
        verification.as_ref(),
    ) {
        Ok(entry) => HttpResponse::Created().json(entry),
        Err(e) => db_error(e),
    }
}

/// Register the hash on chain if the verify program is configured.
/// Ingestion proceeds either way; the signature is just recorded when present.
async fn register_on_chain(state: &AppState, content_hash: &str) -> Option<String> {
    let program_id = state.config.verify_program_id.as_deref()?;
    let signer_key = state.config.verify_signer_key.as_deref()?;

    let result = async {
        let program_id = verify::parse_program_id(program_id)?;
        let signer = verify::parse_signer(signer_key)?;
        let hash = verify::parse_content_hash(content_hash)?;
        verify::register_content(
            &state.http,
            &state.config.solana_rpc_url,
            &program_id,
            &signer,
            &hash,
            "asi1-mini",
        )
        .await
    }
    .await;

    match result {
        Ok(signature) => Some(signature),
        Err(e) => {
            log::warn!("On-chain registration failed for {}: {}", content_hash, e);
            None
        }
    }
}

async fn list_entries(
    state: web::Data<AppState>,
    query: web::Query<ListKnowledgeQuery>,
) -> impl Responder {
    match state.db.list_knowledge(query.agent_id.as_deref()) {
        Ok(entries) => HttpResponse::Ok().json(json!({ "entries": entries })),
        Err(e) => db_error(e),
    }
}

async fn delete_entry(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.db.delete_knowledge(&path) {
        Ok(true) => HttpResponse::Ok().json(json!({ "success": true })),
        Ok(false) => {
            HttpResponse::NotFound().json(json!({ "success": false, "error": "Entry not found" }))
        }
        Err(e) => db_error(e),
    }
}

async fn search_handler(
    state: web::Data<AppState>,
    body: web::Json<SearchKnowledgeRequest>,
) -> impl Responder {
    match search_entries(&state.db, &state.http, &state.config, &body.query, body.limit).await {
        Ok(results) => HttpResponse::Ok().json(json!({ "results": results })),
        Err(e) => {
            log::error!("Knowledge search failed: {}", e);
            HttpResponse::InternalServerError().json(json!({ "success": false, "error": e }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateAgentRequest;

    fn test_db_with_entries() -> Database {
        let db = Database::new(":memory:").unwrap();
        let agent = db
            .create_agent(&CreateAgentRequest {
                name: "kb-agent".to_string(),
                description: String::new(),
                system_instructions: String::new(),
                agent_type: None,
                capabilities: vec![],
                owner_address: None,
            })
            .unwrap();

        for (title, content) in [
            ("Tokenomics", "total supply and emission schedule for the token"),
            ("Team", "the founding team and advisors"),
            ("Roadmap", "planned token launch milestones for next year"),
        ] {
            let vector = embedding::fallback_embedding(content);
            db.create_knowledge(&agent.id, title, content, &vector, None, None, None)
                .unwrap();
        }
        db
    }

    #[tokio::test]
    async fn vector_search_ranks_exact_content_first() {
        let db = test_db_with_entries();
        let config = Config::for_tests();
        let http = reqwest::Client::new();

        // With no embeddings key, the query uses the same deterministic
        // fallback as ingestion, so identical text scores 1.0.
        let results = search_entries(
            &db,
            &http,
            &config,
            "total supply and emission schedule for the token",
            2,
        )
        .await
        .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Tokenomics");
        assert!(results[0].score > 0.99);
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn text_fallback_when_no_embeddings_stored() {
        let db = Database::new(":memory:").unwrap();
        let agent = db
            .create_agent(&CreateAgentRequest {
                name: "plain".to_string(),
                description: String::new(),
                system_instructions: String::new(),
                agent_type: None,
                capabilities: vec![],
                owner_address: None,
            })
            .unwrap();
        db.create_knowledge(&agent.id, "Notes", "the token launch", &[], None, None, None)
            .unwrap();

        let config = Config::for_tests();
        let http = reqwest::Client::new();
        let results = search_entries(&db, &http, &config, "token", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Notes");
        assert_eq!(results[0].score, 0.0);
    }
}
