use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A capability an agent can be granted (e.g. "Price Tracking", "Web Search").
/// `description_vector` is produced by the embedding generator whenever the
/// description is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capability {
    pub id: String,
    pub name: String,
    pub description: String,
    pub description_vector: Vec<f32>,
    pub capability_type: String,
    pub parameters: Vec<CapabilityParameter>,
    pub api_endpoint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
}

/// Response type for the capability API - the vector is omitted (large, and
/// only used server-side for matching).
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub capability_type: String,
    pub parameters: Vec<CapabilityParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Capability> for CapabilityResponse {
    fn from(cap: Capability) -> Self {
        Self {
            id: cap.id,
            name: cap.name,
            description: cap.description,
            capability_type: cap.capability_type,
            parameters: cap.parameters,
            api_endpoint: cap.api_endpoint,
            created_at: cap.created_at,
            updated_at: cap.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCapabilityRequest {
    pub name: String,
    pub description: String,
    #[serde(default, rename = "type")]
    pub capability_type: Option<String>,
    #[serde(default)]
    pub parameters: Vec<CapabilityParameter>,
    #[serde(default)]
    pub api_endpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCapabilityRequest {
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub capability_type: Option<String>,
    pub parameters: Option<Vec<CapabilityParameter>>,
    pub api_endpoint: Option<Option<String>>,
}
