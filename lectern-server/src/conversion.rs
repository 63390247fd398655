//! Conversion orchestration: upload or text in, synthesized audio out.
//!
//! Every request walks `Received -> Validated -> (Extracting ->) Synthesizing
//! -> Completed`. A validation failure ends in `Rejected`, an extraction or
//! synthesis failure in `Failed`. Nothing is retried.

use axum::http::StatusCode;
use bytes::Bytes;
use lectern_doc::{Document, DocumentFormat};
use lectern_spk::{AudioArtifact, SlotName, SpeechError, SpeechSynthesizer, VoiceDescriptor};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Retrieval path of the upload slot's audio.
pub const UPLOAD_AUDIO_URL: &str = "/download_audio";

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("File or voice selection not provided")]
    MissingField,

    #[error("No file selected")]
    NoFileSelected,

    #[error("Unsupported file type")]
    UnsupportedFileType,

    #[error("Failed to extract text from the file")]
    ExtractionFailed,

    #[error("No text provided")]
    NoTextProvided,

    #[error("Audio not found")]
    NotFound,

    #[error("Speech synthesis failed: {0}")]
    Synthesis(#[from] SpeechError),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConversionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ConversionError::MissingField
            | ConversionError::NoFileSelected
            | ConversionError::UnsupportedFileType
            | ConversionError::NoTextProvided => StatusCode::BAD_REQUEST,
            ConversionError::NotFound => StatusCode::NOT_FOUND,
            ConversionError::ExtractionFailed
            | ConversionError::Synthesis(_)
            | ConversionError::Storage(_)
            | ConversionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients. Server-side failures other than
    /// extraction are reduced to a generic message; details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ConversionError::Synthesis(_) => "Speech synthesis failed".to_string(),
            ConversionError::Storage(_) | ConversionError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Received,
    Validated,
    Extracting,
    Synthesizing,
    Completed,
    Rejected,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::Extracting => "extracting",
            Stage::Synthesizing => "synthesizing",
            Stage::Completed => "completed",
            Stage::Rejected => "rejected",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

fn stage(request: &str, stage: Stage) {
    debug!(request, stage = %stage, "Conversion stage");
}

fn rejected(request: &str, error: ConversionError) -> ConversionError {
    stage(request, Stage::Rejected);
    error
}

fn failed(request: &str, error: ConversionError) -> ConversionError {
    stage(request, Stage::Failed);
    error
}

/// A file part of an upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Upload form as received. Either part may be missing.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub file: Option<UploadedFile>,
    pub voice_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    pub text: String,
    pub audio_url: String,
}

/// Reduce a client supplied file name to its last path component.
///
/// Both `/` and `\` count as separators. Returns None when nothing usable
/// is left (empty, `.`, `..`, or a NUL byte).
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    if base.is_empty() || base == "." || base == ".." || base.contains('\0') {
        return None;
    }
    Some(base.to_string())
}

/// Uploaded documents stored inside the storage root.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
    keep_uploads: bool,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>, keep_uploads: bool) -> Self {
        Self {
            root: root.into(),
            keep_uploads,
        }
    }

    /// Write the document under `safe_name`, which must already be sanitized.
    pub async fn save(&self, safe_name: &str, bytes: &[u8]) -> Result<PathBuf, ConversionError> {
        let path = self.root.join(safe_name);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "Stored upload");
        Ok(path)
    }

    /// Called once the document's text has been extracted.
    pub async fn release(&self, path: &Path) {
        if self.keep_uploads {
            return;
        }
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), "Failed to remove upload: {}", e);
        }
    }
}

/// Drives extraction and synthesis for the HTTP handlers.
#[derive(Clone)]
pub struct ConversionOrchestrator {
    synthesizer: SpeechSynthesizer,
    documents: DocumentStore,
}

impl ConversionOrchestrator {
    pub fn new(synthesizer: SpeechSynthesizer, documents: DocumentStore) -> Self {
        Self { synthesizer, documents }
    }

    pub async fn voices(&self) -> Result<Vec<VoiceDescriptor>, ConversionError> {
        Ok(self.synthesizer.registry().list_voices().await?)
    }

    /// Extract the text of an uploaded document and read it into the upload slot.
    pub async fn upload_convert(&self, request: UploadRequest) -> Result<UploadOutcome, ConversionError> {
        const REQUEST: &str = "upload";
        stage(REQUEST, Stage::Received);

        let (file, voice_id) = match (request.file, request.voice_id) {
            (Some(file), Some(voice_id)) => (file, voice_id),
            _ => return Err(rejected(REQUEST, ConversionError::MissingField)),
        };

        if file.file_name.is_empty() {
            return Err(rejected(REQUEST, ConversionError::NoFileSelected));
        }

        let format = DocumentFormat::from_file_name(&file.file_name)
            .ok_or_else(|| rejected(REQUEST, ConversionError::UnsupportedFileType))?;

        let safe_name = sanitize_file_name(&file.file_name)
            .ok_or_else(|| rejected(REQUEST, ConversionError::NoFileSelected))?;
        stage(REQUEST, Stage::Validated);

        let path = self
            .documents
            .save(&safe_name, &file.bytes)
            .await
            .map_err(|e| failed(REQUEST, e))?;

        stage(REQUEST, Stage::Extracting);
        let document = Document::new(file.bytes, format, safe_name);
        let extraction = tokio::task::spawn_blocking(move || document.extract()).await;
        self.documents.release(&path).await;

        let extraction = extraction
            .map_err(|e| failed(REQUEST, ConversionError::Internal(format!("Extraction task failed: {}", e))))?;
        if extraction.is_empty() {
            return Err(failed(REQUEST, ConversionError::ExtractionFailed));
        }

        stage(REQUEST, Stage::Synthesizing);
        self.synthesizer
            .synthesize(&extraction.text, Some(&voice_id), SlotName::Upload)
            .await
            .map_err(|e| failed(REQUEST, e.into()))?;

        stage(REQUEST, Stage::Completed);
        Ok(UploadOutcome {
            text: extraction.text,
            audio_url: UPLOAD_AUDIO_URL.to_string(),
        })
    }

    /// Read `text` into `slot`.
    pub async fn text_convert(
        &self,
        text: Option<&str>,
        voice_id: Option<&str>,
        slot: SlotName,
    ) -> Result<AudioArtifact, ConversionError> {
        let request = slot.as_str();
        stage(request, Stage::Received);

        let text = match text {
            Some(text) if !text.is_empty() => text,
            _ => return Err(rejected(request, ConversionError::NoTextProvided)),
        };
        stage(request, Stage::Validated);

        stage(request, Stage::Synthesizing);
        let artifact = self
            .synthesizer
            .synthesize(text, voice_id, slot)
            .await
            .map_err(|e| failed(request, e.into()))?;

        stage(request, Stage::Completed);
        Ok(artifact)
    }

    /// Current audio of `slot`.
    pub async fn fetch_audio(&self, slot: SlotName) -> Result<AudioArtifact, ConversionError> {
        self.synthesizer
            .slots()
            .read(slot)
            .await?
            .ok_or(ConversionError::NotFound)
    }
}
