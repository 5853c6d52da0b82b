use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A knowledge base entry created from an uploaded document or a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,
    pub agent_id: String,
    pub title: String,
    pub content: String,
    /// Embedding of `content`, used for vector search
    #[serde(skip_serializing)]
    pub embedding: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationInfo>,
    pub created_at: DateTime<Utc>,
}

/// On-chain verification state attached to a knowledge entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationInfo {
    pub content_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    pub verified: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateKnowledgeRequest {
    pub agent_id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Inline content; mutually exclusive with source_url
    #[serde(default)]
    pub content: Option<String>,
    /// URL to extract via OCR; mutually exclusive with content
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
}
