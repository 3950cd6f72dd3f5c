use crate::{TtsError, TtsProvider, TtsRequest, TtsResult};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;

pub struct GeminiProvider {
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TtsProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn synthesize(&self, request: TtsRequest) -> TtsResult<Vec<u8>> {
        let model = request
            .options
            .get("model")
            .and_then(|v| v.as_str())
            .unwrap_or("gemini-2.5-flash-preview-tts");

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            model, self.api_key
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": request.text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": request.voice }
                    }
                }
            }
        });

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(TtsError::ProviderError(format!(
                "Gemini API error: {}",
                error_text
            )));
        }

        let response_json: serde_json::Value = response.json().await?;

        // Audio arrives base64-encoded inline in the first candidate part.
        let encoded = response_json
            .pointer("/candidates/0/content/parts/0/inlineData/data")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                TtsError::ProviderError("No audio data found in Gemini response".to_string())
            })?;

        general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| TtsError::ProviderError(format!("Failed to decode base64 audio: {}", e)))
    }
}
