//! ElevenLabs proxy: text-to-speech, returned as base64 audio.

use actix_web::{web, HttpResponse, Responder};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::AppState;

const TTS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";
const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
const TTS_MODEL: &str = "eleven_multilingual_v2";

pub async fn synthesize(
    client: &reqwest::Client,
    api_key: &str,
    text: &str,
    voice_id: &str,
) -> Result<String, String> {
    let resp = client
        .post(format!("{}/{}", TTS_URL, voice_id))
        .header("xi-api-key", api_key)
        .timeout(Duration::from_secs(60))
        .json(&json!({ "text": text, "model_id": TTS_MODEL }))
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !resp.status().is_success() {
        return Err(format!("API error: {}", resp.status()));
    }

    let bytes = resp.bytes().await.map_err(|e| format!("Read error: {}", e))?;
    Ok(STANDARD.encode(&bytes))
}

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    #[serde(default)]
    pub voice_id: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/tools/elevenlabs/tts").route(web::post().to(tts_handler)));
}

async fn tts_handler(state: web::Data<AppState>, body: web::Json<TtsRequest>) -> impl Responder {
    let api_key = match &state.config.elevenlabs_api_key {
        Some(k) => k,
        None => {
            return HttpResponse::InternalServerError()
                .json(json!({ "success": false, "error": "ElevenLabs API key not configured" }));
        }
    };

    if body.text.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "error": "Text cannot be empty" }));
    }

    let voice = body.voice_id.as_deref().unwrap_or(DEFAULT_VOICE_ID);
    match synthesize(&state.http, api_key, &body.text, voice).await {
        Ok(audio) => HttpResponse::Ok().json(json!({
            "success": true,
            "audio": audio,
            "contentType": "audio/mpeg",
        })),
        Err(e) => {
            log::error!("TTS failed: {}", e);
            HttpResponse::BadGateway().json(json!({ "success": false, "error": e }))
        }
    }
}
