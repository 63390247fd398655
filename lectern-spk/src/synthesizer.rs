//! Speech synthesizer writing into audio slots

use crate::config::{SpeechConfig, TtsEngine as EngineKind};
use crate::engines::api::ApiTtsEngine;
use crate::engines::native::NativeTtsEngine;
use crate::engines::TtsEngine;
use crate::error::SpeechError;
use crate::slots::{AudioArtifact, SlotName, SlotStore};
use crate::voices::VoiceRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Resolves a voice, runs the engine once and stores the result in a slot.
///
/// There is no queue and no cache: each call synthesizes from scratch and
/// replaces the slot's previous artifact.
#[derive(Clone)]
pub struct SpeechSynthesizer {
    engine: Arc<dyn TtsEngine>,
    registry: VoiceRegistry,
    slots: SlotStore,
    timeout: Option<Duration>,
}

impl SpeechSynthesizer {
    /// Create a synthesizer for the engine named in `config`
    pub fn new(config: &SpeechConfig, slots: SlotStore) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Config)?;

        let engine: Arc<dyn TtsEngine> = match config.engine {
            EngineKind::Native => {
                let engine = NativeTtsEngine::new_with_config(config.rate, config.volume, config.pitch);
                if !engine.is_available() {
                    return Err(SpeechError::Engine("Native TTS engine not available".to_string()));
                }
                Arc::new(engine)
            }
            EngineKind::OpenAi => {
                let api_config = config.api_config.clone().unwrap_or_default();
                let engine = ApiTtsEngine::new(&api_config, config.rate)?;
                if !engine.is_available() {
                    return Err(SpeechError::Engine("OpenAI TTS not available (API key missing)".to_string()));
                }
                Arc::new(engine)
            }
        };

        info!("Speech synthesizer initialized with engine: {}", engine.name());
        Ok(Self::with_engine(engine, slots, config.synthesis_timeout()))
    }

    /// Create a synthesizer around an already constructed engine
    pub fn with_engine(engine: Arc<dyn TtsEngine>, slots: SlotStore, timeout: Option<Duration>) -> Self {
        Self {
            registry: VoiceRegistry::new(engine.clone()),
            engine,
            slots,
            timeout,
        }
    }

    pub fn registry(&self) -> &VoiceRegistry {
        &self.registry
    }

    pub fn slots(&self) -> &SlotStore {
        &self.slots
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Synthesize `text` with the voice resolved from `voice_id` and replace
    /// the content of `slot` with the result.
    ///
    /// Empty text is handed to the engine unchanged.
    pub async fn synthesize(
        &self,
        text: &str,
        voice_id: Option<&str>,
        slot: SlotName,
    ) -> Result<AudioArtifact, SpeechError> {
        let voice = self.registry.resolve_voice(voice_id).await?;
        debug!(slot = %slot, voice = %voice.id, chars = text.len(), "Synthesizing");

        let synthesis = self.engine.synthesize(text, &voice);
        let audio = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, synthesis)
                .await
                .map_err(|_| SpeechError::Timeout(limit))??,
            None => synthesis.await?,
        };

        self.slots.write(slot, audio).await
    }
}
