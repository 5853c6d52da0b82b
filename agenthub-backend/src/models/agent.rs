use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Agent as stored in the database.
///
/// API keys are stored as plaintext strings, matching the original platform's
/// explicit decision ("without encryption"). Responses never include raw
/// values; see [`AgentResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub description: String,
    pub system_instructions: String,
    pub agent_type: String,
    /// Capability ids referenced by this agent
    pub capabilities: Vec<String>,
    /// Owning wallet address; None means the agent is public
    pub owner_address: Option<String>,
    /// service name -> key value, plaintext
    pub api_keys: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// Plain string equality against the stored chat key. No hashing,
    /// mirroring the original auth model.
    pub fn chat_key_matches(&self, presented: &str) -> bool {
        self.api_keys
            .get("chat")
            .map(|k| k == presented)
            .unwrap_or(false)
    }
}

/// Mask a key value to a short preview: first 3 and last 4 characters.
/// Counts characters, not bytes, so multibyte values mask cleanly.
pub fn mask_key(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

/// Response type for agent API - api_keys reduced to masked previews
#[derive(Debug, Clone, Serialize)]
pub struct AgentResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub system_instructions: String,
    #[serde(rename = "type")]
    pub agent_type: String,
    pub capabilities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_address: Option<String>,
    pub api_keys: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Agent> for AgentResponse {
    fn from(agent: Agent) -> Self {
        let masked = agent
            .api_keys
            .iter()
            .map(|(service, value)| (service.clone(), mask_key(value)))
            .collect();
        Self {
            id: agent.id,
            name: agent.name,
            description: agent.description,
            system_instructions: agent.system_instructions,
            agent_type: agent.agent_type,
            capabilities: agent.capabilities,
            owner_address: agent.owner_address,
            api_keys: masked,
            created_at: agent.created_at,
            updated_at: agent.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAgentRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub system_instructions: String,
    #[serde(default, rename = "type")]
    pub agent_type: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub owner_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAgentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub system_instructions: Option<String>,
    #[serde(rename = "type")]
    pub agent_type: Option<String>,
    pub capabilities: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_key_keeps_only_edges() {
        assert_eq!(mask_key("sk-1234567890abcd"), "sk-…abcd");
        assert_eq!(mask_key("short"), "*****");
    }

    #[test]
    fn mask_key_handles_multibyte_values() {
        assert_eq!(mask_key("ééééééééé"), "ééé…éééé");
        assert_eq!(mask_key("sk-键值键值键值键"), "sk-…值键值键");
        assert_eq!(mask_key("日本語キー"), "*****");
    }

    #[test]
    fn chat_key_is_plain_equality() {
        let mut agent = Agent {
            id: "a1".into(),
            name: "test".into(),
            description: String::new(),
            system_instructions: String::new(),
            agent_type: "assistant".into(),
            capabilities: vec![],
            owner_address: None,
            api_keys: HashMap::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(!agent.chat_key_matches("anything"));
        agent.api_keys.insert("chat".into(), "sekret".into());
        assert!(agent.chat_key_matches("sekret"));
        assert!(!agent.chat_key_matches("Sekret"));
    }
}
