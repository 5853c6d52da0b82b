use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::config::Config;

pub const EMBEDDING_DIM: usize = 384;

const TOGETHER_EMBEDDINGS_URL: &str = "https://api.together.xyz/v1/embeddings";
const EMBEDDING_MODEL: &str = "togethercomputer/m2-bert-80M-8k-retrieval";

/// Produce a fixed-length embedding for `text`.
///
/// When an embeddings API key is configured the remote model is used; without
/// one (local dev, tests) a deterministic pseudo-vector is generated instead,
/// so vector search stays exercisable offline.
pub async fn embed(client: &reqwest::Client, config: &Config, text: &str) -> Vec<f32> {
    if let Some(key) = &config.together_api_key {
        match remote_embedding(client, key, text).await {
            Ok(v) => return v,
            Err(e) => {
                log::warn!("Embeddings API failed, using fallback vector: {}", e);
            }
        }
    }
    fallback_embedding(text)
}

async fn remote_embedding(
    client: &reqwest::Client,
    api_key: &str,
    text: &str,
) -> Result<Vec<f32>, String> {
    let resp = client
        .post(TOGETHER_EMBEDDINGS_URL)
        .bearer_auth(api_key)
        .timeout(std::time::Duration::from_secs(30))
        .json(&json!({ "model": EMBEDDING_MODEL, "input": text }))
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !resp.status().is_success() {
        return Err(format!("API error: {}", resp.status()));
    }

    let body: serde_json::Value = resp.json().await.map_err(|e| format!("Parse error: {}", e))?;
    let vector = body
        .get("data")
        .and_then(|d| d.get(0))
        .and_then(|d| d.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| "Missing embedding in response".to_string())?
        .iter()
        .filter_map(|v| v.as_f64().map(|f| f as f32))
        .collect::<Vec<f32>>();

    if vector.is_empty() {
        return Err("Empty embedding in response".to_string());
    }
    Ok(vector)
}

/// Deterministic unit-norm pseudo-vector seeded from the SHA-256 of the text.
pub fn fallback_embedding(text: &str) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    let mut rng = StdRng::from_seed(seed);

    let mut vector: Vec<f32> = (0..EMBEDDING_DIM).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_deterministic() {
        let a = fallback_embedding("hello world");
        let b = fallback_embedding("hello world");
        let c = fallback_embedding("hello worlds");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), EMBEDDING_DIM);
    }

    #[test]
    fn fallback_is_unit_norm() {
        let v = fallback_embedding("normalize me");
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn cosine_similarity_basics() {
        let v = fallback_embedding("same");
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
        assert_eq!(cosine_similarity(&v, &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }
}
