//! Tool access seam for the chat pipeline.
//!
//! [`ToolClient`] is what [`run_turn`](super::run_turn) sees; the production
//! implementation fans out to the tool proxies and the knowledge store, while
//! tests substitute a mock.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::controllers::knowledge;
use crate::db::Database;
use crate::orchestrator::KnowledgeResult;
use crate::tools::coingecko::{self, TokenDetail, TokenSearchResult};
use crate::tools::fetchai::{self, Completion};
use crate::tools::helius::{self, Portfolio, TxSummary};
use crate::tools::serper::{self, SearchResult};
use crate::tools::together::{self, IntentData};

use super::{COMPLETION_MAX_TOKENS, COMPLETION_TEMPERATURE};

#[async_trait]
pub trait ToolClient: Send + Sync {
    async fn search_knowledge(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<KnowledgeResult>, String>;

    async fn web_search(&self, query: &str, num: usize) -> Result<Vec<SearchResult>, String>;

    async fn classify_intent(&self, query: &str) -> Result<IntentData, String>;

    async fn search_tokens(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<TokenSearchResult>, String>;

    async fn token_detail(&self, id: &str) -> Result<TokenDetail, String>;

    async fn wallet_portfolio(&self, address: &str) -> Result<Portfolio, String>;

    async fn wallet_transactions(&self, address: &str) -> Result<Vec<TxSummary>, String>;

    async fn complete(
        &self,
        prompt: &str,
        system_instruction: &str,
    ) -> Result<Completion, String>;
}

/// Production client backed by the external APIs and the local database.
pub struct HttpToolClient {
    pub db: Arc<Database>,
    pub config: Config,
    pub http: reqwest::Client,
}

impl HttpToolClient {
    pub fn new(db: Arc<Database>, config: Config, http: reqwest::Client) -> Self {
        Self { db, config, http }
    }

    fn require_key<'a>(key: &'a Option<String>, name: &str) -> Result<&'a str, String> {
        key.as_deref()
            .ok_or_else(|| format!("{} API key not configured", name))
    }
}

#[async_trait]
impl ToolClient for HttpToolClient {
    async fn search_knowledge(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<KnowledgeResult>, String> {
        knowledge::search_entries(&self.db, &self.http, &self.config, query, limit).await
    }

    async fn web_search(&self, query: &str, num: usize) -> Result<Vec<SearchResult>, String> {
        let key = Self::require_key(&self.config.serper_api_key, "Serper")?;
        serper::web_search(&self.http, key, query, num).await
    }

    async fn classify_intent(&self, query: &str) -> Result<IntentData, String> {
        let key = Self::require_key(&self.config.together_api_key, "Together")?;
        together::classify_intent(&self.http, key, query).await
    }

    async fn search_tokens(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<TokenSearchResult>, String> {
        coingecko::search_tokens(
            &self.http,
            self.config.coingecko_api_key.as_deref(),
            query,
            limit,
        )
        .await
    }

    async fn token_detail(&self, id: &str) -> Result<TokenDetail, String> {
        coingecko::token_detail(&self.http, self.config.coingecko_api_key.as_deref(), id).await
    }

    async fn wallet_portfolio(&self, address: &str) -> Result<Portfolio, String> {
        let key = Self::require_key(&self.config.helius_api_key, "Helius")?;
        helius::wallet_portfolio(&self.http, key, address).await
    }

    async fn wallet_transactions(&self, address: &str) -> Result<Vec<TxSummary>, String> {
        let key = Self::require_key(&self.config.helius_api_key, "Helius")?;
        helius::recent_transactions(&self.http, key, address).await
    }

    async fn complete(
        &self,
        prompt: &str,
        system_instruction: &str,
    ) -> Result<Completion, String> {
        let key = Self::require_key(&self.config.fetchai_api_key, "ASI-1")?;
        fetchai::complete(
            &self.http,
            key,
            prompt,
            system_instruction,
            COMPLETION_TEMPERATURE,
            COMPLETION_MAX_TOKENS,
        )
        .await
    }
}
