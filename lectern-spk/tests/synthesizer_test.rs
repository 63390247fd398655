//! Tests for SpeechSynthesizer: voice resolution, slot overwrite, failures and timeouts

use async_trait::async_trait;
use bytes::Bytes;
use lectern_spk::engines::TtsEngine;
use lectern_spk::{CustomTtsEngine, SlotName, SlotStore, SpeechError, SpeechSynthesizer, VoiceDescriptor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn voices() -> Vec<VoiceDescriptor> {
    vec![
        VoiceDescriptor::new("en-us", "English (America)"),
        VoiceDescriptor::new("fr-fr", "French (France)"),
    ]
}

/// Engine whose "audio" is `voice|text`, so tests can see what was synthesized.
fn echo_engine() -> Arc<dyn TtsEngine> {
    Arc::new(CustomTtsEngine::with_voices("echo", voices(), |text, voice| {
        Ok(Bytes::from(format!("{}|{}", voice.id, text)))
    }))
}

fn synthesizer(dir: &TempDir, engine: Arc<dyn TtsEngine>) -> SpeechSynthesizer {
    let slots = SlotStore::new(dir.path()).unwrap();
    SpeechSynthesizer::with_engine(engine, slots, None)
}

#[tokio::test]
async fn test_synthesize_writes_slot() {
    let dir = TempDir::new().unwrap();
    let synth = synthesizer(&dir, echo_engine());

    let artifact = synth.synthesize("Hello", Some("fr-fr"), SlotName::Text).await.unwrap();
    assert_eq!(artifact.slot, SlotName::Text);
    assert_eq!(artifact.bytes, Bytes::from("fr-fr|Hello"));

    let on_disk = std::fs::read(dir.path().join("text_output.mp3")).unwrap();
    assert_eq!(on_disk, b"fr-fr|Hello");
}

#[tokio::test]
async fn test_second_synthesis_overwrites_slot() {
    let dir = TempDir::new().unwrap();
    let synth = synthesizer(&dir, echo_engine());

    synth.synthesize("first text", None, SlotName::Paragraph).await.unwrap();
    synth.synthesize("second", None, SlotName::Paragraph).await.unwrap();

    let stored = synth.slots().read(SlotName::Paragraph).await.unwrap().unwrap();
    assert_eq!(stored.bytes, Bytes::from("en-us|second"));
}

#[tokio::test]
async fn test_slots_are_independent() {
    let dir = TempDir::new().unwrap();
    let synth = synthesizer(&dir, echo_engine());

    synth.synthesize("upload", None, SlotName::Upload).await.unwrap();
    synth.synthesize("text", None, SlotName::Text).await.unwrap();

    let upload = synth.slots().read(SlotName::Upload).await.unwrap().unwrap();
    assert_eq!(upload.bytes, Bytes::from("en-us|upload"));
    assert!(synth.slots().read(SlotName::Paragraph).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_voice_uses_first_voice() {
    let dir = TempDir::new().unwrap();
    let synth = synthesizer(&dir, echo_engine());

    let artifact = synth.synthesize("Hi", Some("klingon"), SlotName::Text).await.unwrap();
    assert_eq!(artifact.bytes, Bytes::from("en-us|Hi"));
}

#[tokio::test]
async fn test_empty_text_is_passed_to_engine() {
    let dir = TempDir::new().unwrap();
    let synth = synthesizer(&dir, echo_engine());

    let artifact = synth.synthesize("", None, SlotName::Text).await.unwrap();
    assert_eq!(artifact.bytes, Bytes::from("en-us|"));
}

#[tokio::test]
async fn test_engine_called_exactly_once() {
    let dir = TempDir::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let engine = CustomTtsEngine::with_voices("failing", voices(), move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(SpeechError::Engine("device busy".to_string()))
    });
    let synth = synthesizer(&dir, Arc::new(engine));

    let result = synth.synthesize("Hello", None, SlotName::Text).await;
    assert!(matches!(result, Err(SpeechError::Engine(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_synthesis_keeps_previous_artifact() {
    let dir = TempDir::new().unwrap();
    let engine = CustomTtsEngine::with_voices("picky", voices(), |text, _| {
        if text == "bad" {
            Err(SpeechError::Engine("cannot pronounce".to_string()))
        } else {
            Ok(Bytes::from(text.to_string()))
        }
    });
    let synth = synthesizer(&dir, Arc::new(engine));

    synth.synthesize("good", None, SlotName::Upload).await.unwrap();
    assert!(synth.synthesize("bad", None, SlotName::Upload).await.is_err());

    let stored = synth.slots().read(SlotName::Upload).await.unwrap().unwrap();
    assert_eq!(stored.bytes, Bytes::from("good"));
}

#[tokio::test]
async fn test_no_voices_available() {
    let dir = TempDir::new().unwrap();
    let engine = CustomTtsEngine::with_voices("mute", vec![], |_, _| Ok(Bytes::from_static(b"x")));
    let synth = synthesizer(&dir, Arc::new(engine));

    let result = synth.synthesize("Hello", Some("en-us"), SlotName::Text).await;
    assert!(matches!(result, Err(SpeechError::NoVoicesAvailable)));
    assert!(synth.slots().read(SlotName::Text).await.unwrap().is_none());
}

struct SlowEngine;

#[async_trait]
impl TtsEngine for SlowEngine {
    async fn synthesize(&self, _text: &str, _voice: &VoiceDescriptor) -> Result<Bytes, SpeechError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Bytes::from_static(b"late"))
    }

    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SpeechError> {
        Ok(voices())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "slow"
    }
}

#[tokio::test]
async fn test_synthesis_timeout() {
    let dir = TempDir::new().unwrap();
    let slots = SlotStore::new(dir.path()).unwrap();
    let synth = SpeechSynthesizer::with_engine(Arc::new(SlowEngine), slots, Some(Duration::from_millis(50)));

    let result = synth.synthesize("Hello", None, SlotName::Text).await;
    assert!(matches!(result, Err(SpeechError::Timeout(_))));
    assert!(synth.slots().read(SlotName::Text).await.unwrap().is_none());
}

#[tokio::test]
async fn test_registry_lists_engine_voices_in_order() {
    let dir = TempDir::new().unwrap();
    let synth = synthesizer(&dir, echo_engine());

    let listed = synth.registry().list_voices().await.unwrap();
    assert_eq!(listed, voices());
    assert_eq!(synth.engine_name(), "echo");
}
