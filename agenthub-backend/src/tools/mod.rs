pub mod coingecko;
pub mod elevenlabs;
pub mod fetchai;
pub mod helius;
pub mod jina;
pub mod serper;
pub mod together;

/// User agent sent on outbound tool requests
pub const USER_AGENT: &str = concat!("AgentHub/", env!("CARGO_PKG_VERSION"));
