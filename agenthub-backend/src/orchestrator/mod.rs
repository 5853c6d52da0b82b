//! Chat turn pipeline.
//!
//! One turn walks a fixed sequence: gate capabilities, augment the system
//! prompt, gather knowledge and web context, classify intent, enrich with
//! token or wallet data, then request the completion. Every enrichment step
//! degrades to "no contribution" on failure; only the completion call is
//! load-bearing. The pipeline is written against the [`ToolClient`] trait so
//! the public chat endpoint and tests share the exact same control flow.

pub mod client;

pub use client::{HttpToolClient, ToolClient};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::tools::coingecko::TokenSearchResult;
use crate::tools::together::{self, IntentData};

const TOKEN_LIMIT: usize = 3;
const KNOWLEDGE_LIMIT: usize = 3;
const WEB_SEARCH_NUM: usize = 5;
const WEB_RESULTS_KEPT: usize = 3;
const COMPLETION_TEMPERATURE: f64 = 0.7;
const COMPLETION_MAX_TOKENS: u32 = 1000;

const PLACEHOLDER_LOGO: &str = "https://assets.coingecko.com/coins/images/missing_large.png";

const COMPLETION_FAILURE_MESSAGE: &str =
    "I'm sorry, I ran into a problem generating a response. Please try again in a moment.";

const NO_WALLET_MESSAGE: &str = "I couldn't find a wallet address in your message. \
Please include a Solana address or connect your wallet and ask again.";

static BASE58_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[1-9A-HJ-NP-Za-km-z]{32,44}").expect("valid regex"));

/// Everything one chat turn needs from the caller.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub message: String,
    pub agent_name: String,
    pub system_instructions: String,
    /// Capability names attached to the agent.
    pub capabilities: Vec<String>,
    /// Wallet the caller has connected, if any.
    pub connected_wallet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeResult {
    pub title: String,
    pub content: String,
    pub score: f64,
}

/// Token descriptor attached to replies for chart rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCard {
    pub id: String,
    pub token_name: String,
    pub token_symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_address: Option<String>,
    pub logo_url: String,
}

impl TokenCard {
    fn from_search(token: &TokenSearchResult) -> Self {
        Self {
            id: token.id.clone(),
            token_name: token.name.clone(),
            token_symbol: token.symbol.clone(),
            token_address: token.contract_address.clone(),
            logo_url: token
                .image
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_LOGO.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantMessage {
    pub role: &'static str,
    pub content: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<IntentData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_data: Option<Vec<TokenCard>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_results: Option<Vec<KnowledgeResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_results: Option<Vec<crate::tools::serper::SearchResult>>,
    pub timestamp: DateTime<Utc>,
}

impl AssistantMessage {
    fn plain(content: impl Into<String>) -> Self {
        Self {
            role: "assistant",
            content: content.into(),
            error: false,
            thought: None,
            intent: None,
            token_data: None,
            knowledge_results: None,
            search_results: None,
            timestamp: Utc::now(),
        }
    }

    fn failure() -> Self {
        Self {
            error: true,
            ..Self::plain(COMPLETION_FAILURE_MESSAGE)
        }
    }
}

/// Flat membership test over capability names.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityFlags {
    pub has_finance: bool,
    pub has_blockchain: bool,
    pub has_search: bool,
}

impl CapabilityFlags {
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut flags = Self::default();
        for name in names {
            match name.as_ref() {
                "Price Tracking" | "Market Analysis" => flags.has_finance = true,
                "Transaction Analysis" | "Wallet Insights" => flags.has_blockchain = true,
                "Web Search" | "Knowledge Retrieval" => flags.has_search = true,
                _ => {}
            }
        }
        flags
    }
}

/// Append one fixed sentence per enabled capability class, then the voice
/// sentence unconditionally. Order: base, finance, blockchain, search, voice.
pub fn augment_system_instructions(base: &str, flags: CapabilityFlags) -> String {
    let mut out = base.to_string();
    if flags.has_finance {
        out.push_str(" You can look up live token prices and market data when asked.");
    }
    if flags.has_blockchain {
        out.push_str(" You can analyze Solana wallets, their holdings, and recent transactions.");
    }
    if flags.has_search {
        out.push_str(" You can draw on web search results and a knowledge base for current information.");
    }
    out.push_str(" Your replies may be read aloud, so phrase them naturally for speech.");
    out
}

/// First base58-looking run of 32 to 44 characters in the message, if any.
pub fn extract_wallet_address(message: &str) -> Option<String> {
    BASE58_ADDRESS
        .find(message)
        .map(|m| m.as_str().to_string())
}

fn fmt_usd(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("${}", v),
        None => "N/A".to_string(),
    }
}

fn fmt_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}%", v),
        None => "N/A".to_string(),
    }
}

/// Run one chat turn end to end. Never panics and never returns a transport
/// error to the caller; the worst outcome is a synthesized apology message.
pub async fn run_turn(tools: &dyn ToolClient, req: &TurnRequest) -> AssistantMessage {
    let flags = CapabilityFlags::from_names(&req.capabilities);
    let system_instruction = augment_system_instructions(&req.system_instructions, flags);

    // Context accumulator lives for the whole turn so every stage appends to
    // the same string regardless of which branches run.
    let mut additional_context = String::new();

    let knowledge_results = match tools
        .search_knowledge(&req.message, KNOWLEDGE_LIMIT)
        .await
    {
        Ok(mut results) => {
            results.truncate(KNOWLEDGE_LIMIT);
            results
        }
        Err(e) => {
            log::warn!("Knowledge search failed for {}: {}", req.agent_name, e);
            Vec::new()
        }
    };

    let mut search_results = Vec::new();
    if flags.has_search {
        match tools.web_search(&req.message, WEB_SEARCH_NUM).await {
            Ok(results) => {
                search_results = results.into_iter().take(WEB_RESULTS_KEPT).collect();
                if !search_results.is_empty() {
                    additional_context.push_str("\n\n### Recent web search results:\n");
                    for result in &search_results {
                        additional_context.push_str(&format!(
                            "{}. {} - {} ({})\n",
                            result.position, result.title, result.snippet, result.link
                        ));
                    }
                }
            }
            Err(e) => log::warn!("Web search failed for {}: {}", req.agent_name, e),
        }
    }

    let intent = match tools.classify_intent(&req.message).await {
        Ok(intent) => intent,
        Err(e) => {
            log::warn!("Intent classification failed, using default: {}", e);
            IntentData::default_intent()
        }
    };

    let mut token_data: Option<Vec<TokenCard>> = None;
    if intent.primary_intent == together::INTENT_TOKEN_PRICE && flags.has_finance {
        let tokens = match tools
            .search_tokens(&req.message.to_lowercase(), TOKEN_LIMIT)
            .await
        {
            Ok(tokens) => tokens,
            Err(e) => {
                log::warn!("Token search failed: {}", e);
                Vec::new()
            }
        };

        let mut cards = Vec::with_capacity(tokens.len());
        for token in &tokens {
            cards.push(TokenCard::from_search(token));
            match tools.token_detail(&token.id).await {
                Ok(detail) => {
                    additional_context.push_str(&format!(
                        "\n\n### Market data for {} ({}):\n\
                         - Current Price: {}\n\
                         - 24h Change: {}\n\
                         - All-Time High: {}\n\
                         - Market Cap: {}\n\
                         - 24h Volume: {}",
                        token.name,
                        token.symbol,
                        fmt_usd(detail.current_price_usd),
                        fmt_pct(detail.price_change_24h),
                        fmt_usd(detail.ath_usd),
                        fmt_usd(detail.market_cap_usd),
                        fmt_usd(detail.volume_24h_usd),
                    ));
                }
                // One token's detail failing must not stop the others.
                Err(e) => log::warn!("Token detail failed for {}: {}", token.id, e),
            }
        }
        if !cards.is_empty() {
            token_data = Some(cards);
        }
    } else if intent.primary_intent == together::INTENT_WALLET_ANALYSIS && flags.has_blockchain {
        let address = extract_wallet_address(&req.message)
            .or_else(|| req.connected_wallet.clone());

        let address = match address {
            Some(addr) => addr,
            None => {
                // Deliberate short-circuit: nothing to analyze, so answer
                // directly without a completion call.
                let mut msg = AssistantMessage::plain(NO_WALLET_MESSAGE);
                msg.intent = Some(intent);
                if !knowledge_results.is_empty() {
                    msg.knowledge_results = Some(knowledge_results);
                }
                return msg;
            }
        };

        match tools.wallet_portfolio(&address).await {
            Ok(portfolio) => {
                additional_context.push_str(&format!(
                    "\n\n### Wallet portfolio for {}:\n- SOL Balance: {}\n- Total Assets: {}",
                    address,
                    portfolio.sol_balance,
                    portfolio.assets.len()
                ));
                if !portfolio.assets.is_empty() {
                    let top: Vec<&str> = portfolio
                        .assets
                        .iter()
                        .take(3)
                        .map(String::as_str)
                        .collect();
                    additional_context
                        .push_str(&format!("\n- Top assets: {}", top.join(", ")));
                }
            }
            Err(e) => {
                log::warn!("Portfolio lookup failed for {}: {}", address, e);
                additional_context
                    .push_str("\n\nNo portfolio data is available for this wallet.");
            }
        }

        match tools.wallet_transactions(&address).await {
            Ok(txs) => {
                additional_context
                    .push_str(&format!("\n\n### Recent activity: {} transactions", txs.len()));
                if let Some(latest) = txs.first() {
                    additional_context
                        .push_str(&format!(", latest at unix time {}", latest.timestamp));
                }
            }
            Err(e) => {
                log::warn!("Transaction lookup failed for {}: {}", address, e);
                additional_context
                    .push_str("\n\nNo recent transaction data is available for this wallet.");
            }
        }
    }

    let prompt = format!("{}{}", req.message, additional_context);
    let completion = match tools.complete(&prompt, &system_instruction).await {
        Ok(completion) => completion,
        Err(e) => {
            log::error!("Completion failed for {}: {}", req.agent_name, e);
            return AssistantMessage::failure();
        }
    };

    let mut msg = AssistantMessage::plain(completion.completion);
    msg.thought = completion.thought;
    msg.intent = Some(intent);
    msg.token_data = token_data;
    if !knowledge_results.is_empty() {
        msg.knowledge_results = Some(knowledge_results);
    }
    if !search_results.is_empty() {
        msg.search_results = Some(search_results);
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::coingecko::TokenDetail;
    use crate::tools::fetchai::{Completion, Usage};
    use crate::tools::helius::{Portfolio, TxSummary};
    use crate::tools::serper::SearchResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockToolClient {
        knowledge: Result<Vec<KnowledgeResult>, String>,
        search: Result<Vec<SearchResult>, String>,
        intent: Result<IntentData, String>,
        tokens: Result<Vec<TokenSearchResult>, String>,
        detail: Result<TokenDetail, String>,
        portfolio: Result<Portfolio, String>,
        transactions: Result<Vec<TxSummary>, String>,
        completion: Result<Completion, String>,
        calls: Mutex<Vec<&'static str>>,
        last_prompt: Mutex<Option<String>>,
        last_system: Mutex<Option<String>>,
    }

    impl Default for MockToolClient {
        fn default() -> Self {
            Self {
                knowledge: Ok(Vec::new()),
                search: Ok(Vec::new()),
                intent: Ok(IntentData::default_intent()),
                tokens: Ok(Vec::new()),
                detail: Err("no detail configured".to_string()),
                portfolio: Err("no portfolio configured".to_string()),
                transactions: Ok(Vec::new()),
                completion: Ok(Completion {
                    completion: "Here you go.".to_string(),
                    thought: None,
                    model: "test-model".to_string(),
                    usage: Usage::default(),
                }),
                calls: Mutex::new(Vec::new()),
                last_prompt: Mutex::new(None),
                last_system: Mutex::new(None),
            }
        }
    }

    impl MockToolClient {
        fn record(&self, name: &'static str) {
            self.calls.lock().unwrap().push(name);
        }

        fn called(&self, name: &str) -> bool {
            self.calls.lock().unwrap().iter().any(|c| *c == name)
        }

        fn prompt(&self) -> String {
            self.last_prompt.lock().unwrap().clone().unwrap_or_default()
        }
    }

    #[async_trait]
    impl ToolClient for MockToolClient {
        async fn search_knowledge(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<KnowledgeResult>, String> {
            self.record("search_knowledge");
            self.knowledge.clone()
        }

        async fn web_search(
            &self,
            _query: &str,
            _num: usize,
        ) -> Result<Vec<SearchResult>, String> {
            self.record("web_search");
            self.search.clone()
        }

        async fn classify_intent(&self, _query: &str) -> Result<IntentData, String> {
            self.record("classify_intent");
            self.intent.clone()
        }

        async fn search_tokens(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<TokenSearchResult>, String> {
            self.record("search_tokens");
            self.tokens.clone()
        }

        async fn token_detail(&self, _id: &str) -> Result<TokenDetail, String> {
            self.record("token_detail");
            self.detail.clone()
        }

        async fn wallet_portfolio(&self, _address: &str) -> Result<Portfolio, String> {
            self.record("wallet_portfolio");
            self.portfolio.clone()
        }

        async fn wallet_transactions(&self, _address: &str) -> Result<Vec<TxSummary>, String> {
            self.record("wallet_transactions");
            self.transactions.clone()
        }

        async fn complete(
            &self,
            prompt: &str,
            system_instruction: &str,
        ) -> Result<Completion, String> {
            self.record("complete");
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            *self.last_system.lock().unwrap() = Some(system_instruction.to_string());
            self.completion.clone()
        }
    }

    fn turn(message: &str, capabilities: &[&str]) -> TurnRequest {
        TurnRequest {
            message: message.to_string(),
            agent_name: "test-agent".to_string(),
            system_instructions: "You are helpful.".to_string(),
            capabilities: capabilities.iter().map(|s| s.to_string()).collect(),
            connected_wallet: None,
        }
    }

    fn intent(primary: &str) -> IntentData {
        IntentData {
            primary_intent: primary.to_string(),
            confidence: 0.9,
            search_query: None,
        }
    }

    #[tokio::test]
    async fn classifier_failure_defaults_to_customer_support() {
        let mock = MockToolClient {
            intent: Err("boom".to_string()),
            ..Default::default()
        };
        let msg = run_turn(&mock, &turn("hello", &["Price Tracking"])).await;
        assert!(!msg.error);
        assert_eq!(
            msg.intent.unwrap().primary_intent,
            together::INTENT_CUSTOMER_SUPPORT
        );
        assert!(!mock.called("search_tokens"));
        assert!(!mock.called("wallet_portfolio"));
    }

    #[tokio::test]
    async fn all_enrichment_failures_still_reach_completion() {
        let mock = MockToolClient {
            knowledge: Err("down".to_string()),
            search: Err("down".to_string()),
            intent: Ok(intent(together::INTENT_TOKEN_PRICE)),
            tokens: Ok(vec![TokenSearchResult {
                id: "solana".to_string(),
                name: "Solana".to_string(),
                symbol: "sol".to_string(),
                description: None,
                image: None,
                contract_address: None,
            }]),
            detail: Err("rate limited".to_string()),
            ..Default::default()
        };
        let msg = run_turn(
            &mock,
            &turn("price of sol?", &["Price Tracking", "Web Search"]),
        )
        .await;
        assert!(!msg.error);
        assert!(mock.called("complete"));
        assert!(msg.knowledge_results.is_none());
        assert!(msg.search_results.is_none());
        // Token card is still attached even though its detail fetch failed.
        assert_eq!(msg.token_data.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn wallet_intent_without_address_exits_before_completion() {
        let mock = MockToolClient {
            intent: Ok(intent(together::INTENT_WALLET_ANALYSIS)),
            ..Default::default()
        };
        let msg = run_turn(&mock, &turn("analyze my wallet pls", &["Wallet Insights"])).await;
        assert!(!msg.error);
        assert!(msg.content.contains("wallet address"));
        assert!(!mock.called("complete"));
        assert!(!mock.called("wallet_portfolio"));
    }

    #[tokio::test]
    async fn disabled_capabilities_gate_their_stages() {
        let mock = MockToolClient {
            intent: Ok(intent(together::INTENT_TOKEN_PRICE)),
            ..Default::default()
        };
        // No search or finance capability at all.
        let msg = run_turn(&mock, &turn("price of sol?", &["Voice Synthesis"])).await;
        assert!(!msg.error);
        assert!(!mock.called("web_search"));
        assert!(!mock.called("search_tokens"));
        assert!(mock.called("complete"));
    }

    #[tokio::test]
    async fn completion_failure_yields_one_apology_message() {
        let mock = MockToolClient {
            search: Ok(vec![SearchResult {
                title: "t".to_string(),
                link: "l".to_string(),
                snippet: "s".to_string(),
                position: 1,
            }]),
            completion: Err("502".to_string()),
            ..Default::default()
        };
        let msg = run_turn(&mock, &turn("hello", &["Web Search"])).await;
        assert!(msg.error);
        assert_eq!(msg.content, COMPLETION_FAILURE_MESSAGE);
        assert!(msg.token_data.is_none());
        assert!(msg.search_results.is_none());
    }

    #[tokio::test]
    async fn sol_price_scenario_builds_expected_prompt_and_card() {
        let mock = MockToolClient {
            intent: Ok(intent(together::INTENT_TOKEN_PRICE)),
            tokens: Ok(vec![TokenSearchResult {
                id: "solana".to_string(),
                name: "Solana".to_string(),
                symbol: "sol".to_string(),
                description: None,
                image: None,
                contract_address: None,
            }]),
            detail: Ok(TokenDetail {
                current_price_usd: Some(150.0),
                price_change_24h: Some(1.2),
                ath_usd: Some(260.0),
                market_cap_usd: None,
                volume_24h_usd: None,
                image: None,
            }),
            ..Default::default()
        };
        let msg = run_turn(&mock, &turn("What's the price of SOL?", &["Price Tracking"])).await;
        assert!(!msg.error);
        assert!(mock.prompt().contains("Current Price: $150"));
        let cards = msg.token_data.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].token_symbol, "sol");
        assert_eq!(cards[0].logo_url, PLACEHOLDER_LOGO);
    }

    #[tokio::test]
    async fn wallet_scenario_reports_sol_balance() {
        let address = "FgxqqCJ2TpXw6pEHvVgcyLYTHSBYb5wMEnKKkWBhFDKe";
        let mock = MockToolClient {
            intent: Ok(intent(together::INTENT_WALLET_ANALYSIS)),
            portfolio: Ok(Portfolio {
                sol_balance: 2.5,
                assets: Vec::new(),
            }),
            ..Default::default()
        };
        let msg = run_turn(
            &mock,
            &turn(
                &format!("what's in {}?", address),
                &["Transaction Analysis"],
            ),
        )
        .await;
        assert!(!msg.error);
        assert!(mock.called("complete"));
        assert!(mock.prompt().contains("SOL Balance: 2.5"));
    }

    #[tokio::test]
    async fn connected_wallet_is_used_when_message_has_no_address() {
        let mut req = turn("how is my wallet doing?", &["Wallet Insights"]);
        req.connected_wallet =
            Some("FgxqqCJ2TpXw6pEHvVgcyLYTHSBYb5wMEnKKkWBhFDKe".to_string());
        let mock = MockToolClient {
            intent: Ok(intent(together::INTENT_WALLET_ANALYSIS)),
            portfolio: Ok(Portfolio {
                sol_balance: 1.0,
                assets: vec!["Thing".to_string()],
            }),
            ..Default::default()
        };
        let msg = run_turn(&mock, &req).await;
        assert!(!msg.error);
        assert!(mock.called("wallet_portfolio"));
        assert!(mock.called("complete"));
    }

    #[test]
    fn capability_flags_from_names() {
        let flags =
            CapabilityFlags::from_names(&["Price Tracking", "Web Search", "Something Else"]);
        assert!(flags.has_finance);
        assert!(flags.has_search);
        assert!(!flags.has_blockchain);
    }

    #[test]
    fn system_instructions_append_in_fixed_order() {
        let flags = CapabilityFlags {
            has_finance: true,
            has_blockchain: true,
            has_search: true,
        };
        let out = augment_system_instructions("Base.", flags);
        let finance = out.find("token prices").unwrap();
        let blockchain = out.find("Solana wallets").unwrap();
        let search = out.find("web search results").unwrap();
        let voice = out.find("read aloud").unwrap();
        assert!(out.starts_with("Base."));
        assert!(finance < blockchain && blockchain < search && search < voice);

        // Voice sentence is appended even with no capabilities enabled.
        let bare = augment_system_instructions("Base.", CapabilityFlags::default());
        assert!(bare.contains("read aloud"));
        assert!(!bare.contains("token prices"));
    }

    #[test]
    fn wallet_address_extraction() {
        let addr = "FgxqqCJ2TpXw6pEHvVgcyLYTHSBYb5wMEnKKkWBhFDKe";
        assert_eq!(
            extract_wallet_address(&format!("check {} now", addr)).as_deref(),
            Some(addr)
        );
        // 0, O, I, l are outside the base58 alphabet.
        assert!(extract_wallet_address("0000000000000000000000000000000000").is_none());
        assert!(extract_wallet_address("too short").is_none());
    }
}
