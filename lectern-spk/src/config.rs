//! Configuration for speech synthesis

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Preferred TTS engine
    pub engine: TtsEngine,

    /// Speech rate (words per minute, 0-500, default 175)
    pub rate: u32,

    /// Volume (0.0-1.0, default 1.0)
    pub volume: f32,

    /// Pitch adjustment (-1.0 to 1.0, default 0.0)
    pub pitch: f32,

    /// API configuration (if using API-based TTS)
    pub api_config: Option<ApiTtsConfig>,

    /// Upper bound for a single synthesis call. None waits for the engine
    /// however long it takes.
    pub synthesis_timeout_secs: Option<u64>,
}

/// TTS Engine type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TtsEngine {
    /// Native platform TTS (macOS `say`, Linux espeak-ng, Windows SAPI)
    Native,
    /// OpenAI-compatible speech API
    OpenAi,
}

impl FromStr for TtsEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(TtsEngine::Native),
            "openai" => Ok(TtsEngine::OpenAi),
            other => Err(format!("Unknown TTS engine '{}' (expected 'native' or 'openai')", other)),
        }
    }
}

/// API TTS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiTtsConfig {
    /// API endpoint URL (without the `/v1/audio/speech` path)
    pub endpoint: String,

    /// API key (optional, falls back to `OPENAI_API_KEY`)
    pub api_key: Option<String>,

    /// Model ID
    pub model: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            engine: TtsEngine::Native,
            rate: 175,
            volume: 1.0,
            pitch: 0.0,
            api_config: None,
            synthesis_timeout_secs: None,
        }
    }
}

impl Default for ApiTtsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com".to_string(),
            api_key: None,
            model: None,
            timeout_secs: 60,
        }
    }
}

impl ApiTtsConfig {
    /// Validate API configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err("API endpoint cannot be empty".to_string());
        }

        let url = url::Url::parse(&self.endpoint)
            .map_err(|e| format!("Invalid API endpoint '{}': {}", self.endpoint, e))?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err("API endpoint must use http or https".to_string());
        }

        if let Some(ref model) = self.model {
            if model.len() > 256 {
                return Err("API model name too long (max 256 chars)".to_string());
            }
            if model.chars().any(|c| c == '\0' || c.is_control()) {
                return Err("API model name contains invalid characters".to_string());
            }
        }

        if self.timeout_secs == 0 {
            return Err("API timeout must be greater than 0".to_string());
        }

        if self.timeout_secs > 300 {
            return Err("API timeout too large (max 300 seconds)".to_string());
        }

        Ok(())
    }
}

impl SpeechConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.rate > 500 {
            return Err("Speech rate must be between 0 and 500 WPM".to_string());
        }

        if !(0.0..=1.0).contains(&self.volume) {
            return Err("Volume must be between 0.0 and 1.0".to_string());
        }

        if !(-1.0..=1.0).contains(&self.pitch) {
            return Err("Pitch must be between -1.0 and 1.0".to_string());
        }

        if self.synthesis_timeout_secs == Some(0) {
            return Err("Synthesis timeout must be greater than 0".to_string());
        }

        if let Some(api_config) = &self.api_config {
            api_config.validate()?;
        }

        Ok(())
    }

    pub fn synthesis_timeout(&self) -> Option<Duration> {
        self.synthesis_timeout_secs.map(Duration::from_secs)
    }
}
