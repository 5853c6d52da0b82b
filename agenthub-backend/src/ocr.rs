use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};

const MISTRAL_OCR_URL: &str = "https://api.mistral.ai/v1/ocr";
const OCR_MODEL: &str = "mistral-ocr-latest";

/// Text extracted from a document or URL.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub title: String,
    pub content: String,
    pub page_count: usize,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    pages: Vec<OcrPage>,
}

#[derive(Debug, Deserialize)]
struct OcrPage {
    #[serde(default)]
    markdown: String,
}

/// Run the OCR API over a document URL and join page markdown.
pub async fn extract_url(
    client: &reqwest::Client,
    api_key: &str,
    url: &str,
) -> Result<ExtractedDocument, String> {
    let resp = client
        .post(MISTRAL_OCR_URL)
        .bearer_auth(api_key)
        .timeout(std::time::Duration::from_secs(60))
        .json(&json!({
            "model": OCR_MODEL,
            "document": { "type": "document_url", "document_url": url }
        }))
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !resp.status().is_success() {
        return Err(format!("API error: {}", resp.status()));
    }

    let body: OcrResponse = resp.json().await.map_err(|e| format!("Parse error: {}", e))?;
    if body.pages.is_empty() {
        return Err("No pages in OCR response".to_string());
    }

    let content = body
        .pages
        .iter()
        .map(|p| p.markdown.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(ExtractedDocument {
        title: derive_title(&content, url),
        page_count: body.pages.len(),
        content,
    })
}

/// Hex SHA-256 of extracted text; the identity used by the on-chain
/// verification program.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// First markdown heading if present, otherwise the URL itself.
fn derive_title(content: &str, url: &str) -> String {
    content
        .lines()
        .find_map(|line| line.strip_prefix("# ").map(|t| t.trim().to_string()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_stable_hex() {
        let h = content_hash("hello");
        assert_eq!(h.len(), 64);
        assert_eq!(h, content_hash("hello"));
        assert_ne!(h, content_hash("hello!"));
    }

    #[test]
    fn title_falls_back_to_url() {
        assert_eq!(
            derive_title("plain text\nno heading", "https://example.com/doc.pdf"),
            "https://example.com/doc.pdf"
        );
        assert_eq!(derive_title("# Whitepaper\nbody", "u"), "Whitepaper");
    }
}
