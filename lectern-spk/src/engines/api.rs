//! OpenAI-compatible speech API engine

use crate::config::ApiTtsConfig;
use crate::engines::TtsEngine;
use crate::error::SpeechError;
use crate::voices::VoiceDescriptor;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const DEFAULT_MODEL: &str = "tts-1";

/// Voices offered by the OpenAI speech endpoint. The API has no listing call.
const OPENAI_VOICES: [(&str, &str); 6] = [
    ("alloy", "Alloy"),
    ("echo", "Echo"),
    ("fable", "Fable"),
    ("onyx", "Onyx"),
    ("nova", "Nova"),
    ("shimmer", "Shimmer"),
];

/// TTS engine backed by `POST {endpoint}/v1/audio/speech`.
///
/// Every request is attempted once; failures are returned to the caller.
pub struct ApiTtsEngine {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    rate: u32,
}

impl ApiTtsEngine {
    pub fn new(config: &ApiTtsConfig, rate: u32) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Config)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SpeechError::Engine(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            rate,
        })
    }

    fn api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.is_empty())
    }

    /// Map words per minute onto the API's speed factor (0.25 to 4.0, 1.0 at 175 WPM).
    fn speed(&self) -> f32 {
        (self.rate as f32 / 175.0).clamp(0.25, 4.0)
    }
}

#[async_trait]
impl TtsEngine for ApiTtsEngine {
    async fn synthesize(&self, text: &str, voice: &VoiceDescriptor) -> Result<Bytes, SpeechError> {
        let api_key = self
            .api_key()
            .ok_or_else(|| SpeechError::Api("OpenAI API key not provided".to_string()))?;

        let request_body = json!({
            "model": self.model,
            "input": text,
            "voice": voice.id,
            "response_format": "mp3",
            "speed": self.speed(),
        });

        let url = format!("{}/v1/audio/speech", self.endpoint);
        debug!(url = %url, voice = %voice.id, chars = text.len(), "Requesting speech");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| SpeechError::Api(format!("Speech API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SpeechError::Api(format!("Speech API error ({}): {}", status, error_text)));
        }

        response
            .bytes()
            .await
            .map_err(|e| SpeechError::Api(format!("Failed to read audio response: {}", e)))
    }

    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SpeechError> {
        Ok(OPENAI_VOICES
            .iter()
            .map(|(id, name)| VoiceDescriptor::new(*id, *name))
            .collect())
    }

    fn is_available(&self) -> bool {
        self.api_key().is_some()
    }

    fn name(&self) -> &str {
        "openai"
    }
}
