//! Tests for ConversionOrchestrator

use bytes::Bytes;
use lectern_server::conversion::{
    ConversionError, ConversionOrchestrator, DocumentStore, UploadRequest, UploadedFile, UPLOAD_AUDIO_URL,
};
use lectern_spk::{CustomTtsEngine, SlotName, SlotStore, SpeechError, SpeechSynthesizer, VoiceDescriptor};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn orchestrator(root: &Path, keep_uploads: bool) -> ConversionOrchestrator {
    let engine = CustomTtsEngine::with_voices(
        "echo",
        vec![
            VoiceDescriptor::new("v1", "Voice One"),
            VoiceDescriptor::new("v2", "Voice Two"),
        ],
        |text, voice| Ok(Bytes::from(format!("{}|{}", voice.id, text))),
    );
    let slots = SlotStore::new(root).unwrap();
    let synthesizer = SpeechSynthesizer::with_engine(Arc::new(engine), slots, None);
    ConversionOrchestrator::new(synthesizer, DocumentStore::new(root, keep_uploads))
}

fn upload(file_name: &str, contents: &[u8], voice_id: &str) -> UploadRequest {
    UploadRequest {
        file: Some(UploadedFile {
            file_name: file_name.to_string(),
            bytes: Bytes::copy_from_slice(contents),
        }),
        voice_id: Some(voice_id.to_string()),
    }
}

fn files_in(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(root)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_upload_txt() {
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator(dir.path(), true);

    let outcome = orchestrator
        .upload_convert(upload("hello.txt", b"Hello world", "v2"))
        .await
        .unwrap();
    assert_eq!(outcome.text, "Hello world");
    assert_eq!(outcome.audio_url, UPLOAD_AUDIO_URL);

    let audio = orchestrator.fetch_audio(SlotName::Upload).await.unwrap();
    assert_eq!(audio.bytes, Bytes::from("v2|Hello world"));
    assert_eq!(files_in(dir.path()), vec!["hello.txt", "output.mp3"]);
}

#[tokio::test]
async fn test_upload_extension_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator(dir.path(), true);

    let outcome = orchestrator.upload_convert(upload("NOTES.TXT", b"Shout", "v1")).await.unwrap();
    assert_eq!(outcome.text, "Shout");
}

#[tokio::test]
async fn test_upload_unsupported_type_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator(dir.path(), true);

    let result = orchestrator.upload_convert(upload("setup.exe", b"MZ", "v1")).await;
    assert!(matches!(result, Err(ConversionError::UnsupportedFileType)));

    let result = orchestrator.upload_convert(upload("README", b"text", "v1")).await;
    assert!(matches!(result, Err(ConversionError::UnsupportedFileType)));

    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn test_upload_strips_directories_from_name() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("uploads");
    let orchestrator = orchestrator(&root, true);

    orchestrator
        .upload_convert(upload("../../etc/passwd.txt", b"root:x:0:0", "v1"))
        .await
        .unwrap();

    assert_eq!(std::fs::read(root.join("passwd.txt")).unwrap(), b"root:x:0:0");
    assert!(!dir.path().join("etc").exists());
    assert_eq!(files_in(dir.path()), vec!["uploads"]);
}

#[tokio::test]
async fn test_upload_missing_parts() {
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator(dir.path(), true);

    let mut no_voice = upload("a.txt", b"text", "v1");
    no_voice.voice_id = None;
    assert!(matches!(
        orchestrator.upload_convert(no_voice).await,
        Err(ConversionError::MissingField)
    ));

    let no_file = UploadRequest {
        file: None,
        voice_id: Some("v1".to_string()),
    };
    assert!(matches!(
        orchestrator.upload_convert(no_file).await,
        Err(ConversionError::MissingField)
    ));

    assert!(matches!(
        orchestrator.upload_convert(upload("", b"text", "v1")).await,
        Err(ConversionError::NoFileSelected)
    ));
}

#[tokio::test]
async fn test_upload_empty_voice_uses_default() {
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator(dir.path(), true);

    orchestrator.upload_convert(upload("a.txt", b"Hi", "")).await.unwrap();
    let audio = orchestrator.fetch_audio(SlotName::Upload).await.unwrap();
    assert_eq!(audio.bytes, Bytes::from("v1|Hi"));
}

#[tokio::test]
async fn test_upload_empty_extraction_fails() {
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator(dir.path(), true);

    let result = orchestrator.upload_convert(upload("empty.txt", b"", "v1")).await;
    assert!(matches!(result, Err(ConversionError::ExtractionFailed)));

    let result = orchestrator.upload_convert(upload("broken.pdf", b"%PDF-1.4 garbage", "v1")).await;
    assert!(matches!(result, Err(ConversionError::ExtractionFailed)));

    assert!(matches!(
        orchestrator.fetch_audio(SlotName::Upload).await,
        Err(ConversionError::NotFound)
    ));
}

#[tokio::test]
async fn test_upload_removed_when_not_kept() {
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator(dir.path(), false);

    orchestrator.upload_convert(upload("doc.txt", b"Read me", "v1")).await.unwrap();
    assert_eq!(files_in(dir.path()), vec!["output.mp3"]);
}

#[tokio::test]
async fn test_text_convert() {
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator(dir.path(), true);

    let artifact = orchestrator
        .text_convert(Some("Once upon a time"), Some("v2"), SlotName::Text)
        .await
        .unwrap();
    assert_eq!(artifact.slot, SlotName::Text);
    assert_eq!(artifact.bytes, Bytes::from("v2|Once upon a time"));
}

#[tokio::test]
async fn test_text_convert_requires_text() {
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator(dir.path(), true);

    assert!(matches!(
        orchestrator.text_convert(None, None, SlotName::Text).await,
        Err(ConversionError::NoTextProvided)
    ));
    assert!(matches!(
        orchestrator.text_convert(Some(""), Some("v1"), SlotName::Paragraph).await,
        Err(ConversionError::NoTextProvided)
    ));
}

#[tokio::test]
async fn test_sequential_text_converts_keep_last() {
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator(dir.path(), true);

    orchestrator.text_convert(Some("first"), None, SlotName::Paragraph).await.unwrap();
    orchestrator.text_convert(Some("second"), None, SlotName::Paragraph).await.unwrap();

    let audio = orchestrator.fetch_audio(SlotName::Paragraph).await.unwrap();
    assert_eq!(audio.bytes, Bytes::from("v1|second"));
}

#[tokio::test]
async fn test_synthesis_failure_surfaces() {
    let dir = TempDir::new().unwrap();
    let engine = CustomTtsEngine::with_voices("broken", vec![VoiceDescriptor::new("v1", "One")], |_, _| {
        Err(SpeechError::Engine("no audio device".to_string()))
    });
    let slots = SlotStore::new(dir.path()).unwrap();
    let synthesizer = SpeechSynthesizer::with_engine(Arc::new(engine), slots, None);
    let orchestrator = ConversionOrchestrator::new(synthesizer, DocumentStore::new(dir.path(), true));

    let result = orchestrator.upload_convert(upload("a.txt", b"text", "v1")).await;
    assert!(matches!(result, Err(ConversionError::Synthesis(_))));
}

#[tokio::test]
async fn test_voices() {
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator(dir.path(), true);

    let voices = orchestrator.voices().await.unwrap();
    assert_eq!(voices.len(), 2);
    assert_eq!(voices[0].id, "v1");
}
