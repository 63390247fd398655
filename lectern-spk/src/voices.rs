//! Voice enumeration and resolution

use crate::engines::TtsEngine;
use crate::error::SpeechError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// An installed voice as reported by the engine.
///
/// Identifiers are only stable within one process run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    pub id: String,
    pub name: String,
}

impl VoiceDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Enumerates the engine's voices and resolves requested voice IDs.
#[derive(Clone)]
pub struct VoiceRegistry {
    engine: Arc<dyn TtsEngine>,
}

impl VoiceRegistry {
    pub fn new(engine: Arc<dyn TtsEngine>) -> Self {
        Self { engine }
    }

    /// Voices in the order the engine reports them.
    pub async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SpeechError> {
        let voices = self.engine.list_voices().await?;
        debug!(engine = self.engine.name(), count = voices.len(), "Enumerated voices");
        Ok(voices)
    }

    /// Resolve `requested` against the engine's current voices.
    pub async fn resolve_voice(&self, requested: Option<&str>) -> Result<VoiceDescriptor, SpeechError> {
        let voices = self.list_voices().await?;
        resolve_in(&voices, requested)
    }
}

/// Pick the voice matching `requested` exactly, falling back to the first
/// voice when nothing is requested or the ID is unknown.
///
/// An unknown ID is not an error; it is logged and replaced by the default.
/// Blank IDs count as not requested.
pub fn resolve_in(voices: &[VoiceDescriptor], requested: Option<&str>) -> Result<VoiceDescriptor, SpeechError> {
    let default = voices.first().ok_or(SpeechError::NoVoicesAvailable)?;

    let requested = match requested.filter(|id| !id.trim().is_empty()) {
        Some(id) => id,
        None => return Ok(default.clone()),
    };

    match voices.iter().find(|voice| voice.id == requested) {
        Some(voice) => Ok(voice.clone()),
        None => {
            warn!("Voice ID {} not found. Using default voice {}.", requested, default.id);
            Ok(default.clone())
        }
    }
}
