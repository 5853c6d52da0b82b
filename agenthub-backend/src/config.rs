use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const COINGECKO_API_KEY: &str = "COINGECKO_API_KEY";
    pub const HELIUS_API_KEY: &str = "HELIUS_API_KEY";
    pub const SERPER_API_KEY: &str = "SERPER_API_KEY";
    pub const JINA_API_KEY: &str = "JINA_API_KEY";
    pub const TOGETHER_API_KEY: &str = "TOGETHER_API_KEY";
    pub const FETCHAI_API_KEY: &str = "ASI_ONE_API_KEY";
    pub const ELEVENLABS_API_KEY: &str = "ELEVENLABS_API_KEY";
    pub const MISTRAL_API_KEY: &str = "MISTRAL_API_KEY";
    pub const SOLANA_RPC_URL: &str = "SOLANA_RPC_URL";
    pub const VERIFY_PROGRAM_ID: &str = "VERIFY_PROGRAM_ID";
    pub const VERIFY_SIGNER_KEY: &str = "VERIFY_SIGNER_KEY";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/agenthub.db";
    pub const SOLANA_RPC_URL: &str = "https://api.devnet.solana.com";
}

/// Wallet addresses allowed to use the admin endpoints.
/// A constant-set membership test, not a policy engine.
pub const ADMIN_ALLOWLIST: &[&str] = &[
    "FgxqqCJ2TpXw6pEHvVgcyLYTHSBYb5wMEnKKkWBhFDKe",
];

pub fn is_admin(address: &str) -> bool {
    ADMIN_ALLOWLIST.contains(&address)
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub coingecko_api_key: Option<String>,
    pub helius_api_key: Option<String>,
    pub serper_api_key: Option<String>,
    pub jina_api_key: Option<String>,
    pub together_api_key: Option<String>,
    pub fetchai_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub mistral_api_key: Option<String>,
    pub solana_rpc_url: String,
    pub verify_program_id: Option<String>,
    pub verify_signer_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var(env_vars::PORT)
                .unwrap_or_else(|_| defaults::PORT.to_string())
                .parse()
                .expect("PORT must be a valid number"),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            coingecko_api_key: env::var(env_vars::COINGECKO_API_KEY).ok(),
            helius_api_key: env::var(env_vars::HELIUS_API_KEY).ok(),
            serper_api_key: env::var(env_vars::SERPER_API_KEY).ok(),
            jina_api_key: env::var(env_vars::JINA_API_KEY).ok(),
            together_api_key: env::var(env_vars::TOGETHER_API_KEY).ok(),
            fetchai_api_key: env::var(env_vars::FETCHAI_API_KEY).ok(),
            elevenlabs_api_key: env::var(env_vars::ELEVENLABS_API_KEY).ok(),
            mistral_api_key: env::var(env_vars::MISTRAL_API_KEY).ok(),
            solana_rpc_url: env::var(env_vars::SOLANA_RPC_URL)
                .unwrap_or_else(|_| defaults::SOLANA_RPC_URL.to_string()),
            verify_program_id: env::var(env_vars::VERIFY_PROGRAM_ID).ok(),
            verify_signer_key: env::var(env_vars::VERIFY_SIGNER_KEY).ok(),
        }
    }

    /// Config suitable for tests: in-memory database, no external keys.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            database_url: ":memory:".to_string(),
            coingecko_api_key: None,
            helius_api_key: None,
            serper_api_key: None,
            jina_api_key: None,
            together_api_key: None,
            fetchai_api_key: None,
            elevenlabs_api_key: None,
            mistral_api_key: None,
            solana_rpc_url: defaults::SOLANA_RPC_URL.to_string(),
            verify_program_id: None,
            verify_signer_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_allowlist_is_exact_match() {
        assert!(is_admin("FgxqqCJ2TpXw6pEHvVgcyLYTHSBYb5wMEnKKkWBhFDKe"));
        assert!(!is_admin("fgxqqcj2tpxw6pehvvgcylythsbyb5wmenkkkwbhfdke"));
        assert!(!is_admin(""));
    }
}
