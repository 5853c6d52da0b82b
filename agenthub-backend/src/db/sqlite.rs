use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result as SqliteResult};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::{
    Agent, Capability, CreateAgentRequest, CreateCapabilityRequest, KnowledgeEntry,
    UpdateAgentRequest, UpdateCapabilityRequest, VerificationInfo,
};

/// Document store. Nested documents (capability refs, api keys, embeddings,
/// verification state) are stored as JSON text columns.
pub struct Database {
    conn: Mutex<Connection>,
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(t) => t.with_timezone(&Utc),
        Err(e) => {
            log::warn!("Unparseable timestamp {:?} in database: {}", s, e);
            Utc::now()
        }
    }
}

fn row_to_agent(row: &rusqlite::Row<'_>) -> rusqlite::Result<Agent> {
    let capabilities: String = row.get(5)?;
    let api_keys: String = row.get(7)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;
    Ok(Agent {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        system_instructions: row.get(3)?,
        agent_type: row.get(4)?,
        capabilities: serde_json::from_str(&capabilities).unwrap_or_default(),
        owner_address: row.get(6)?,
        api_keys: serde_json::from_str(&api_keys).unwrap_or_default(),
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    })
}

fn row_to_capability(row: &rusqlite::Row<'_>) -> rusqlite::Result<Capability> {
    let vector: String = row.get(3)?;
    let parameters: String = row.get(5)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;
    Ok(Capability {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        description_vector: serde_json::from_str(&vector).unwrap_or_default(),
        capability_type: row.get(4)?,
        parameters: serde_json::from_str(&parameters).unwrap_or_default(),
        api_endpoint: row.get(6)?,
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    })
}

fn row_to_knowledge(row: &rusqlite::Row<'_>) -> rusqlite::Result<KnowledgeEntry> {
    let embedding: String = row.get(4)?;
    let verification: Option<String> = row.get(7)?;
    let created_at: String = row.get(8)?;
    Ok(KnowledgeEntry {
        id: row.get(0)?,
        agent_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        embedding: serde_json::from_str(&embedding).unwrap_or_default(),
        file_type: row.get(5)?,
        source_url: row.get(6)?,
        verification: verification.and_then(|v| serde_json::from_str(&v).ok()),
        created_at: parse_ts(&created_at),
    })
}

const AGENT_COLS: &str = "id, name, description, system_instructions, agent_type, capabilities, owner_address, api_keys, created_at, updated_at";
const CAPABILITY_COLS: &str = "id, name, description, description_vector, capability_type, parameters, api_endpoint, created_at, updated_at";
const KNOWLEDGE_COLS: &str =
    "id, agent_id, title, content, embedding, file_type, source_url, verification, created_at";

impl Database {
    pub fn new(database_url: &str) -> SqliteResult<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }

        let conn = Connection::open(database_url)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS agents (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                system_instructions TEXT NOT NULL DEFAULT '',
                agent_type TEXT NOT NULL DEFAULT 'assistant',
                capabilities TEXT NOT NULL DEFAULT '[]',
                owner_address TEXT,
                api_keys TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS capabilities (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                description_vector TEXT NOT NULL DEFAULT '[]',
                capability_type TEXT NOT NULL DEFAULT 'action',
                parameters TEXT NOT NULL DEFAULT '[]',
                api_endpoint TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS knowledge (
                id TEXT PRIMARY KEY,
                agent_id TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                embedding TEXT NOT NULL DEFAULT '[]',
                file_type TEXT,
                source_url TEXT,
                verification TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS api_usage (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                agent_id TEXT NOT NULL,
                endpoint TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    // Agent methods

    pub fn create_agent(&self, req: &CreateAgentRequest) -> SqliteResult<Agent> {
        let conn = self.conn.lock().unwrap();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let agent_type = req.agent_type.clone().unwrap_or_else(|| "assistant".to_string());
        let capabilities = serde_json::to_string(&req.capabilities).unwrap_or_else(|_| "[]".into());

        conn.execute(
            "INSERT INTO agents (id, name, description, system_instructions, agent_type, capabilities, owner_address, api_keys, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, '{}', ?8, ?8)",
            rusqlite::params![
                &id,
                &req.name,
                &req.description,
                &req.system_instructions,
                &agent_type,
                &capabilities,
                &req.owner_address,
                &now.to_rfc3339(),
            ],
        )?;

        Ok(Agent {
            id,
            name: req.name.clone(),
            description: req.description.clone(),
            system_instructions: req.system_instructions.clone(),
            agent_type,
            capabilities: req.capabilities.clone(),
            owner_address: req.owner_address.clone(),
            api_keys: HashMap::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_agent(&self, id: &str) -> SqliteResult<Option<Agent>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM agents WHERE id = ?1", AGENT_COLS))?;
        stmt.query_row([id], row_to_agent).optional()
    }

    pub fn list_agents(&self) -> SqliteResult<Vec<Agent>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM agents ORDER BY created_at", AGENT_COLS))?;
        let agents = stmt
            .query_map([], row_to_agent)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(agents)
    }

    pub fn update_agent(&self, id: &str, req: &UpdateAgentRequest) -> SqliteResult<Option<Agent>> {
        let existing = match self.get_agent(id)? {
            Some(a) => a,
            None => return Ok(None),
        };

        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let capabilities = req
            .capabilities
            .clone()
            .unwrap_or(existing.capabilities);

        conn.execute(
            "UPDATE agents SET name = ?1, description = ?2, system_instructions = ?3, agent_type = ?4, capabilities = ?5, updated_at = ?6 WHERE id = ?7",
            rusqlite::params![
                req.name.as_ref().unwrap_or(&existing.name),
                req.description.as_ref().unwrap_or(&existing.description),
                req.system_instructions
                    .as_ref()
                    .unwrap_or(&existing.system_instructions),
                req.agent_type.as_ref().unwrap_or(&existing.agent_type),
                serde_json::to_string(&capabilities).unwrap_or_else(|_| "[]".into()),
                &now,
                id,
            ],
        )?;

        drop(conn);
        self.get_agent(id)
    }

    pub fn delete_agent(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows_affected = conn.execute("DELETE FROM agents WHERE id = ?1", [id])?;
        conn.execute("DELETE FROM knowledge WHERE agent_id = ?1", [id])?;
        Ok(rows_affected > 0)
    }

    /// Write one service key on an agent. Stored as plaintext.
    pub fn set_agent_api_key(&self, id: &str, service: &str, key: &str) -> SqliteResult<bool> {
        let agent = match self.get_agent(id)? {
            Some(a) => a,
            None => return Ok(false),
        };
        let mut keys = agent.api_keys;
        keys.insert(service.to_string(), key.to_string());

        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE agents SET api_keys = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![
                serde_json::to_string(&keys).unwrap_or_else(|_| "{}".into()),
                Utc::now().to_rfc3339(),
                id,
            ],
        )?;
        Ok(rows > 0)
    }

    pub fn delete_agent_api_key(&self, id: &str, service: &str) -> SqliteResult<bool> {
        let agent = match self.get_agent(id)? {
            Some(a) => a,
            None => return Ok(false),
        };
        let mut keys = agent.api_keys;
        if keys.remove(service).is_none() {
            return Ok(false);
        }

        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE agents SET api_keys = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![
                serde_json::to_string(&keys).unwrap_or_else(|_| "{}".into()),
                Utc::now().to_rfc3339(),
                id,
            ],
        )?;
        Ok(rows > 0)
    }

    // Capability methods

    pub fn create_capability(
        &self,
        req: &CreateCapabilityRequest,
        description_vector: &[f32],
    ) -> SqliteResult<Capability> {
        let conn = self.conn.lock().unwrap();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let capability_type = req
            .capability_type
            .clone()
            .unwrap_or_else(|| "action".to_string());

        conn.execute(
            "INSERT INTO capabilities (id, name, description, description_vector, capability_type, parameters, api_endpoint, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            rusqlite::params![
                &id,
                &req.name,
                &req.description,
                serde_json::to_string(description_vector).unwrap_or_else(|_| "[]".into()),
                &capability_type,
                serde_json::to_string(&req.parameters).unwrap_or_else(|_| "[]".into()),
                &req.api_endpoint,
                &now.to_rfc3339(),
            ],
        )?;

        Ok(Capability {
            id,
            name: req.name.clone(),
            description: req.description.clone(),
            description_vector: description_vector.to_vec(),
            capability_type,
            parameters: req.parameters.clone(),
            api_endpoint: req.api_endpoint.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_capability(&self, id: &str) -> SqliteResult<Option<Capability>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM capabilities WHERE id = ?1",
            CAPABILITY_COLS
        ))?;
        stmt.query_row([id], row_to_capability).optional()
    }

    pub fn get_capability_by_name(&self, name: &str) -> SqliteResult<Option<Capability>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM capabilities WHERE name = ?1",
            CAPABILITY_COLS
        ))?;
        stmt.query_row([name], row_to_capability).optional()
    }

    pub fn list_capabilities(&self) -> SqliteResult<Vec<Capability>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM capabilities ORDER BY name",
            CAPABILITY_COLS
        ))?;
        let caps = stmt
            .query_map([], row_to_capability)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(caps)
    }

    pub fn update_capability(
        &self,
        id: &str,
        req: &UpdateCapabilityRequest,
        description_vector: Option<&[f32]>,
    ) -> SqliteResult<Option<Capability>> {
        let existing = match self.get_capability(id)? {
            Some(c) => c,
            None => return Ok(None),
        };

        let vector = description_vector
            .map(|v| v.to_vec())
            .unwrap_or(existing.description_vector);
        let parameters = req.parameters.clone().unwrap_or(existing.parameters);
        let api_endpoint = match &req.api_endpoint {
            Some(v) => v.clone(),
            None => existing.api_endpoint,
        };

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE capabilities SET description = ?1, description_vector = ?2, capability_type = ?3, parameters = ?4, api_endpoint = ?5, updated_at = ?6 WHERE id = ?7",
            rusqlite::params![
                req.description.as_ref().unwrap_or(&existing.description),
                serde_json::to_string(&vector).unwrap_or_else(|_| "[]".into()),
                req.capability_type
                    .as_ref()
                    .unwrap_or(&existing.capability_type),
                serde_json::to_string(&parameters).unwrap_or_else(|_| "[]".into()),
                &api_endpoint,
                Utc::now().to_rfc3339(),
                id,
            ],
        )?;

        drop(conn);
        self.get_capability(id)
    }

    pub fn delete_capability(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows_affected = conn.execute("DELETE FROM capabilities WHERE id = ?1", [id])?;
        Ok(rows_affected > 0)
    }

    /// Number of agents whose capability list references the given id.
    /// Capability ids are uuids, so a quoted LIKE match on the JSON column
    /// cannot false-positive.
    pub fn count_agents_referencing(&self, capability_id: &str) -> SqliteResult<i64> {
        let conn = self.conn.lock().unwrap();
        let pattern = format!("%\"{}\"%", capability_id);
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM agents WHERE capabilities LIKE ?1",
            [&pattern],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // Knowledge methods

    #[allow(clippy::too_many_arguments)]
    pub fn create_knowledge(
        &self,
        agent_id: &str,
        title: &str,
        content: &str,
        embedding: &[f32],
        file_type: Option<&str>,
        source_url: Option<&str>,
        verification: Option<&VerificationInfo>,
    ) -> SqliteResult<KnowledgeEntry> {
        let conn = self.conn.lock().unwrap();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO knowledge (id, agent_id, title, content, embedding, file_type, source_url, verification, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                &id,
                agent_id,
                title,
                content,
                serde_json::to_string(embedding).unwrap_or_else(|_| "[]".into()),
                file_type,
                source_url,
                verification.and_then(|v| serde_json::to_string(v).ok()),
                &now.to_rfc3339(),
            ],
        )?;

        Ok(KnowledgeEntry {
            id,
            agent_id: agent_id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            embedding: embedding.to_vec(),
            file_type: file_type.map(|s| s.to_string()),
            source_url: source_url.map(|s| s.to_string()),
            verification: verification.cloned(),
            created_at: now,
        })
    }

    pub fn list_knowledge(&self, agent_id: Option<&str>) -> SqliteResult<Vec<KnowledgeEntry>> {
        let conn = self.conn.lock().unwrap();
        let entries = match agent_id {
            Some(aid) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM knowledge WHERE agent_id = ?1 ORDER BY created_at",
                    KNOWLEDGE_COLS
                ))?;
                let rows = stmt
                    .query_map([aid], row_to_knowledge)?
                    .filter_map(|r| r.ok())
                    .collect();
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM knowledge ORDER BY created_at",
                    KNOWLEDGE_COLS
                ))?;
                let rows = stmt
                    .query_map([], row_to_knowledge)?
                    .filter_map(|r| r.ok())
                    .collect();
                rows
            }
        };
        Ok(entries)
    }

    pub fn delete_knowledge(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows_affected = conn.execute("DELETE FROM knowledge WHERE id = ?1", [id])?;
        Ok(rows_affected > 0)
    }

    /// Plain LIKE search over title and content - the fallback path when
    /// vector search is unavailable.
    pub fn search_knowledge_text(
        &self,
        query: &str,
        limit: usize,
    ) -> SqliteResult<Vec<KnowledgeEntry>> {
        let conn = self.conn.lock().unwrap();
        let pattern = format!("%{}%", query);
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM knowledge WHERE title LIKE ?1 OR content LIKE ?1 ORDER BY created_at DESC LIMIT ?2",
            KNOWLEDGE_COLS
        ))?;
        let entries = stmt
            .query_map(rusqlite::params![&pattern, limit as i64], row_to_knowledge)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(entries)
    }

    pub fn update_knowledge_verification(
        &self,
        id: &str,
        verification: &VerificationInfo,
    ) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE knowledge SET verification = ?1 WHERE id = ?2",
            rusqlite::params![serde_json::to_string(verification).ok(), id],
        )?;
        Ok(rows > 0)
    }

    // Usage log

    pub fn record_usage(&self, agent_id: &str, endpoint: &str) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO api_usage (agent_id, endpoint, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![agent_id, endpoint, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn usage_count(&self, agent_id: &str) -> SqliteResult<i64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM api_usage WHERE agent_id = ?1",
            [agent_id],
            |row| row.get(0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateAgentRequest;

    fn test_db() -> Database {
        Database::new(":memory:").expect("in-memory db")
    }

    fn agent_req(name: &str, capabilities: Vec<String>) -> CreateAgentRequest {
        CreateAgentRequest {
            name: name.to_string(),
            description: "test agent".to_string(),
            system_instructions: "be helpful".to_string(),
            agent_type: None,
            capabilities,
            owner_address: None,
        }
    }

    #[test]
    fn agent_roundtrip() {
        let db = test_db();
        let created = db.create_agent(&agent_req("alpha", vec![])).unwrap();
        let fetched = db.get_agent(&created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "alpha");
        assert_eq!(fetched.agent_type, "assistant");
        assert!(fetched.api_keys.is_empty());

        let updated = db
            .update_agent(
                &created.id,
                &UpdateAgentRequest {
                    name: Some("beta".to_string()),
                    description: None,
                    system_instructions: None,
                    agent_type: None,
                    capabilities: None,
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "beta");
        assert_eq!(updated.description, "test agent");

        assert!(db.delete_agent(&created.id).unwrap());
        assert!(db.get_agent(&created.id).unwrap().is_none());
    }

    #[test]
    fn corrupted_timestamp_column_still_reads() {
        let db = test_db();
        let created = db.create_agent(&agent_req("mangled", vec![])).unwrap();
        db.conn
            .lock()
            .unwrap()
            .execute(
                "UPDATE agents SET created_at = 'not-a-date' WHERE id = ?1",
                [&created.id],
            )
            .unwrap();

        let fetched = db.get_agent(&created.id).unwrap().unwrap();
        assert!(fetched.created_at <= Utc::now());
        assert_eq!(fetched.updated_at, created.updated_at);
    }

    #[test]
    fn agent_api_keys_persist_as_plaintext() {
        let db = test_db();
        let agent = db.create_agent(&agent_req("keyed", vec![])).unwrap();
        assert!(db.set_agent_api_key(&agent.id, "chat", "sekret-123").unwrap());

        let fetched = db.get_agent(&agent.id).unwrap().unwrap();
        assert_eq!(fetched.api_keys.get("chat").map(String::as_str), Some("sekret-123"));
        assert!(fetched.chat_key_matches("sekret-123"));

        assert!(db.delete_agent_api_key(&agent.id, "chat").unwrap());
        assert!(!db.delete_agent_api_key(&agent.id, "chat").unwrap());
    }

    #[test]
    fn capability_reference_counting() {
        let db = test_db();
        let cap = db
            .create_capability(
                &CreateCapabilityRequest {
                    name: "Price Tracking".to_string(),
                    description: "track token prices".to_string(),
                    capability_type: None,
                    parameters: vec![],
                    api_endpoint: None,
                },
                &[0.1, 0.2],
            )
            .unwrap();

        assert_eq!(db.count_agents_referencing(&cap.id).unwrap(), 0);
        db.create_agent(&agent_req("holder", vec![cap.id.clone()]))
            .unwrap();
        assert_eq!(db.count_agents_referencing(&cap.id).unwrap(), 1);
    }

    #[test]
    fn capability_name_is_unique() {
        let db = test_db();
        let req = CreateCapabilityRequest {
            name: "Web Search".to_string(),
            description: "search the web".to_string(),
            capability_type: None,
            parameters: vec![],
            api_endpoint: None,
        };
        db.create_capability(&req, &[]).unwrap();
        assert!(db.create_capability(&req, &[]).is_err());
    }

    #[test]
    fn knowledge_text_search_matches_title_and_content() {
        let db = test_db();
        let agent = db.create_agent(&agent_req("kb", vec![])).unwrap();
        db.create_knowledge(&agent.id, "Tokenomics", "supply schedule", &[], None, None, None)
            .unwrap();
        db.create_knowledge(&agent.id, "Roadmap", "the token launch plan", &[], None, None, None)
            .unwrap();
        db.create_knowledge(&agent.id, "Team", "founders", &[], None, None, None)
            .unwrap();

        let hits = db.search_knowledge_text("token", 10).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn database_persists_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("agenthub.db");
        let path = path.to_str().unwrap();

        let id = {
            let db = Database::new(path).unwrap();
            db.create_agent(&agent_req("durable", vec![])).unwrap().id
        };

        let reopened = Database::new(path).unwrap();
        let agent = reopened.get_agent(&id).unwrap().unwrap();
        assert_eq!(agent.name, "durable");
    }

    #[test]
    fn usage_log_appends() {
        let db = test_db();
        db.record_usage("a1", "/api/chat/a1").unwrap();
        db.record_usage("a1", "/api/chat/a1").unwrap();
        assert_eq!(db.usage_count("a1").unwrap(), 2);
        assert_eq!(db.usage_count("other").unwrap(), 0);
    }
}
