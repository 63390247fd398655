//! Custom TTS engine implementation
//! Lets callers plug their own synthesis function in place of a platform engine

use crate::engines::TtsEngine;
use crate::error::SpeechError;
use crate::voices::VoiceDescriptor;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

type SynthesizeFn = dyn Fn(&str, &VoiceDescriptor) -> Result<Bytes, SpeechError> + Send + Sync;
type ListVoicesFn = dyn Fn() -> Result<Vec<VoiceDescriptor>, SpeechError> + Send + Sync;
type AvailableFn = dyn Fn() -> bool + Send + Sync;

/// Custom TTS engine wrapper
pub struct CustomTtsEngine {
    name: String,
    synthesize_fn: Arc<SynthesizeFn>,
    list_voices_fn: Arc<ListVoicesFn>,
    is_available_fn: Arc<AvailableFn>,
}

impl CustomTtsEngine {
    /// Create a new custom TTS engine
    pub fn new<F1, F2, F3>(name: impl Into<String>, synthesize_fn: F1, list_voices_fn: F2, is_available_fn: F3) -> Self
    where
        F1: Fn(&str, &VoiceDescriptor) -> Result<Bytes, SpeechError> + Send + Sync + 'static,
        F2: Fn() -> Result<Vec<VoiceDescriptor>, SpeechError> + Send + Sync + 'static,
        F3: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            synthesize_fn: Arc::new(synthesize_fn),
            list_voices_fn: Arc::new(list_voices_fn),
            is_available_fn: Arc::new(is_available_fn),
        }
    }

    /// Engine with a fixed voice list that is always available.
    pub fn with_voices<F>(name: impl Into<String>, voices: Vec<VoiceDescriptor>, synthesize_fn: F) -> Self
    where
        F: Fn(&str, &VoiceDescriptor) -> Result<Bytes, SpeechError> + Send + Sync + 'static,
    {
        Self::new(name, synthesize_fn, move || Ok(voices.clone()), || true)
    }
}

#[async_trait]
impl TtsEngine for CustomTtsEngine {
    async fn synthesize(&self, text: &str, voice: &VoiceDescriptor) -> Result<Bytes, SpeechError> {
        (self.synthesize_fn)(text, voice)
    }

    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SpeechError> {
        (self.list_voices_fn)()
    }

    fn is_available(&self) -> bool {
        (self.is_available_fn)()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
