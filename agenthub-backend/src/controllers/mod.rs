use actix_web::HttpRequest;

use crate::models::Agent;

pub mod admin;
pub mod agents;
pub mod api_keys;
pub mod capabilities;
pub mod chat;
pub mod health;
pub mod knowledge;
pub mod verify;

/// Write gate for owned agents: when `owner_address` is set, the caller must
/// present the same address in `X-Owner-Address`. Ownerless agents are public
/// and writable by anyone.
pub(crate) fn owner_allows(agent: &Agent, req: &HttpRequest) -> bool {
    match &agent.owner_address {
        Some(owner) => req
            .headers()
            .get("X-Owner-Address")
            .and_then(|v| v.to_str().ok())
            .map(|presented| presented == owner)
            .unwrap_or(false),
        None => true,
    }
}
