//! lectern-spk: Speech synthesis for documents
//!
//! Provides text-to-speech capabilities with:
//! - Native TTS engines (platform-specific command line tools)
//! - An OpenAI-compatible API engine
//! - Voice enumeration and deterministic voice fallback
//! - Fixed audio slots that are replaced atomically on every synthesis

pub mod error;
pub mod config;
pub mod engines;
pub mod voices;
pub mod slots;
pub mod synthesizer;

pub use error::SpeechError;
pub use config::{ApiTtsConfig, SpeechConfig, TtsEngine};
pub use engines::TtsEngine as TtsEngineTrait;
pub use engines::custom::CustomTtsEngine;
pub use voices::{VoiceDescriptor, VoiceRegistry};
pub use slots::{AudioArtifact, SlotName, SlotStore};
pub use synthesizer::SpeechSynthesizer;
