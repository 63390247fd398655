//! TTS engine implementations

pub mod native;
pub mod api;
pub mod custom;

use crate::error::SpeechError;
use crate::voices::VoiceDescriptor;
use async_trait::async_trait;
use bytes::Bytes;

/// Trait for TTS engines
#[async_trait]
pub trait TtsEngine: Send + Sync {
    /// Synthesize text to speech audio with the given voice
    async fn synthesize(&self, text: &str, voice: &VoiceDescriptor) -> Result<Bytes, SpeechError>;

    /// Get available voices, in the engine's own order
    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SpeechError>;

    /// Check if engine is available
    fn is_available(&self) -> bool;

    /// Get engine name
    fn name(&self) -> &str;
}

/// Strip control characters a command line tool would choke on.
pub(crate) fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\r' || *c == '\t')
        .collect()
}
