//! On-chain content verification.
//!
//! Talks to a fixed external Anchor program that stores one record per
//! content hash. This module only builds the program's two instructions,
//! submits them over JSON-RPC, and decodes the record account; the program's
//! semantics are not re-derived here.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use solana_sdk::{
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    message::Message,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_program,
    transaction::Transaction,
};
use std::str::FromStr;
use std::time::Duration;

const CONTENT_SEED: &[u8] = b"content";
const AUTHORITY_SEED: &[u8] = b"authority";

/// Decoded on-chain record for one content hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub content_hash: String,
    pub creator: String,
    pub verified: bool,
    pub created_at: i64,
    pub verified_at: i64,
    pub model_ref: String,
}

fn normalize_rpc_result(value: Value, method: &str) -> Result<Value, String> {
    if let Some(error) = value.get("error") {
        return Err(format!("RPC {} error: {}", method, error));
    }
    value
        .get("result")
        .cloned()
        .ok_or_else(|| format!("RPC {} missing result", method))
}

async fn rpc_call(
    client: &reqwest::Client,
    endpoint: &str,
    method: &str,
    params: Value,
) -> Result<Value, String> {
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    });

    let resp = client
        .post(endpoint)
        .timeout(Duration::from_secs(30))
        .json(&request)
        .send()
        .await
        .map_err(|e| format!("RPC transport failure: {}", e))?;

    if !resp.status().is_success() {
        return Err(format!("RPC http error: {}", resp.status()));
    }

    let body: Value = resp
        .json()
        .await
        .map_err(|e| format!("RPC decode failure: {}", e))?;
    normalize_rpc_result(body, method)
}

/// Hex content hash -> raw 32 bytes.
pub fn parse_content_hash(hex_hash: &str) -> Result<[u8; 32], String> {
    let bytes = hex::decode(hex_hash).map_err(|e| format!("Invalid content hash: {}", e))?;
    bytes
        .try_into()
        .map_err(|_| "Content hash must be 32 bytes".to_string())
}

pub fn parse_program_id(id: &str) -> Result<Pubkey, String> {
    Pubkey::from_str(id).map_err(|e| format!("Invalid program id: {}", e))
}

/// Load the submitting keypair from its base58-encoded secret key.
pub fn parse_signer(secret_b58: &str) -> Result<Keypair, String> {
    let bytes = bs58::decode(secret_b58)
        .into_vec()
        .map_err(|e| format!("Invalid signer key: {}", e))?;
    Keypair::from_bytes(&bytes).map_err(|e| format!("Invalid signer key: {}", e))
}

pub fn content_record_pda(program_id: &Pubkey, content_hash: &[u8; 32]) -> Pubkey {
    Pubkey::find_program_address(&[CONTENT_SEED, content_hash], program_id).0
}

pub fn authority_pda(program_id: &Pubkey, creator: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[AUTHORITY_SEED, creator.as_ref()], program_id).0
}

/// Anchor global instruction discriminator.
fn discriminator(name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("global:{}", name).as_bytes());
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&digest[..8]);
    disc
}

fn borsh_string(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + s.len());
    out.extend_from_slice(&(s.len() as u32).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
    out
}

fn register_instruction(
    program_id: &Pubkey,
    signer: &Pubkey,
    content_hash: &[u8; 32],
    model_ref: &str,
) -> Instruction {
    let mut data = discriminator("register_content").to_vec();
    data.extend_from_slice(content_hash);
    data.extend_from_slice(&borsh_string(model_ref));

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(content_record_pda(program_id, content_hash), false),
            AccountMeta::new(authority_pda(program_id, signer), false),
            AccountMeta::new(*signer, true),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    }
}

fn verify_instruction(program_id: &Pubkey, signer: &Pubkey, content_hash: &[u8; 32]) -> Instruction {
    let mut data = discriminator("verify_content").to_vec();
    data.extend_from_slice(content_hash);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(content_record_pda(program_id, content_hash), false),
            AccountMeta::new_readonly(authority_pda(program_id, signer), false),
            AccountMeta::new(*signer, true),
        ],
        data,
    }
}

async fn submit(
    client: &reqwest::Client,
    rpc_url: &str,
    signer: &Keypair,
    instruction: Instruction,
) -> Result<String, String> {
    let result = rpc_call(
        client,
        rpc_url,
        "getLatestBlockhash",
        json!([{ "commitment": "confirmed" }]),
    )
    .await?;
    let blockhash = result
        .get("value")
        .and_then(|v| v.get("blockhash"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| "Missing blockhash".to_string())?;
    let blockhash =
        Hash::from_str(blockhash).map_err(|e| format!("Invalid blockhash: {}", e))?;

    let message = Message::new(&[instruction], Some(&signer.pubkey()));
    let tx = Transaction::new(&[signer], message, blockhash);
    let bytes =
        bincode::serialize(&tx).map_err(|e| format!("Failed to serialize tx: {}", e))?;

    let result = rpc_call(
        client,
        rpc_url,
        "sendTransaction",
        json!([STANDARD.encode(bytes), { "encoding": "base64" }]),
    )
    .await?;
    result
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| "sendTransaction returned no signature".to_string())
}

/// Register a content hash on chain. Returns the transaction signature.
pub async fn register_content(
    client: &reqwest::Client,
    rpc_url: &str,
    program_id: &Pubkey,
    signer: &Keypair,
    content_hash: &[u8; 32],
    model_ref: &str,
) -> Result<String, String> {
    let ix = register_instruction(program_id, &signer.pubkey(), content_hash, model_ref);
    submit(client, rpc_url, signer, ix).await
}

/// Flip the verified flag on an existing record. Returns the signature.
pub async fn verify_content(
    client: &reqwest::Client,
    rpc_url: &str,
    program_id: &Pubkey,
    signer: &Keypair,
    content_hash: &[u8; 32],
) -> Result<String, String> {
    let ix = verify_instruction(program_id, &signer.pubkey(), content_hash);
    submit(client, rpc_url, signer, ix).await
}

/// Account layout: discriminator(8) | content_hash(32) | creator(32) |
/// verified(1) | created_at(8) | verified_at(8) | model_ref(borsh string).
fn decode_record(bytes: &[u8]) -> Result<ContentRecord, String> {
    const FIXED_LEN: usize = 8 + 32 + 32 + 1 + 8 + 8 + 4;
    if bytes.len() < FIXED_LEN {
        return Err(format!("Record account too short: {} bytes", bytes.len()));
    }

    let content_hash = hex::encode(&bytes[8..40]);
    let creator = bs58::encode(&bytes[40..72]).into_string();
    let verified = bytes[72] != 0;
    let created_at = i64::from_le_bytes(bytes[73..81].try_into().unwrap());
    let verified_at = i64::from_le_bytes(bytes[81..89].try_into().unwrap());

    let ref_len = u32::from_le_bytes(bytes[89..93].try_into().unwrap()) as usize;
    if bytes.len() < FIXED_LEN + ref_len {
        return Err("Record model_ref overruns account data".to_string());
    }
    let model_ref = String::from_utf8(bytes[93..93 + ref_len].to_vec())
        .map_err(|e| format!("Record model_ref not utf8: {}", e))?;

    Ok(ContentRecord {
        content_hash,
        creator,
        verified,
        created_at,
        verified_at,
        model_ref,
    })
}

/// Fetch and decode the record for a content hash, or None if the PDA has no
/// account yet.
pub async fn fetch_record(
    client: &reqwest::Client,
    rpc_url: &str,
    program_id: &Pubkey,
    content_hash: &[u8; 32],
) -> Result<Option<ContentRecord>, String> {
    let pda = content_record_pda(program_id, content_hash);
    let result = rpc_call(
        client,
        rpc_url,
        "getAccountInfo",
        json!([pda.to_string(), { "encoding": "base64" }]),
    )
    .await?;

    let value = result.get("value");
    if value.map(|v| v.is_null()).unwrap_or(true) {
        return Ok(None);
    }

    let data_b64 = value
        .and_then(|v| v.get("data"))
        .and_then(|d| d.get(0))
        .and_then(|d| d.as_str())
        .ok_or_else(|| "Account data missing".to_string())?;
    let bytes = STANDARD
        .decode(data_b64)
        .map_err(|e| format!("Account data not base64: {}", e))?;

    decode_record(&bytes).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_program() -> Pubkey {
        Pubkey::new_unique()
    }

    #[test]
    fn pda_derivation_is_deterministic() {
        let program = test_program();
        let hash = [7u8; 32];
        assert_eq!(
            content_record_pda(&program, &hash),
            content_record_pda(&program, &hash)
        );
        assert_ne!(
            content_record_pda(&program, &hash),
            content_record_pda(&program, &[8u8; 32])
        );
    }

    #[test]
    fn discriminators_differ_per_instruction() {
        assert_ne!(discriminator("register_content"), discriminator("verify_content"));
    }

    #[test]
    fn register_data_layout() {
        let program = test_program();
        let signer = Pubkey::new_unique();
        let hash = [1u8; 32];
        let ix = register_instruction(&program, &signer, &hash, "asi1-mini");
        assert_eq!(&ix.data[..8], &discriminator("register_content"));
        assert_eq!(&ix.data[8..40], &hash);
        assert_eq!(&ix.data[40..44], &9u32.to_le_bytes());
        assert_eq!(&ix.data[44..], b"asi1-mini");
        assert_eq!(ix.accounts.len(), 4);
        assert!(ix.accounts[2].is_signer);
    }

    #[test]
    fn record_roundtrip_decode() {
        let creator = Pubkey::new_unique();
        let mut bytes = vec![0u8; 8];
        bytes.extend_from_slice(&[3u8; 32]);
        bytes.extend_from_slice(creator.as_ref());
        bytes.push(1);
        bytes.extend_from_slice(&1_700_000_000i64.to_le_bytes());
        bytes.extend_from_slice(&1_700_000_100i64.to_le_bytes());
        bytes.extend_from_slice(&5u32.to_le_bytes());
        bytes.extend_from_slice(b"model");

        let record = decode_record(&bytes).unwrap();
        assert_eq!(record.content_hash, hex::encode([3u8; 32]));
        assert_eq!(record.creator, creator.to_string());
        assert!(record.verified);
        assert_eq!(record.created_at, 1_700_000_000);
        assert_eq!(record.verified_at, 1_700_000_100);
        assert_eq!(record.model_ref, "model");
    }

    #[test]
    fn short_account_rejected() {
        assert!(decode_record(&[0u8; 20]).is_err());
        assert!(parse_content_hash("zz").is_err());
        assert!(parse_content_hash(&hex::encode([9u8; 32])).is_ok());
    }
}
