//! Best-effort text extraction

use crate::format::DocumentFormat;
use crate::{docx, pdf};
use bytes::Bytes;
use tracing::{debug, warn};

/// An uploaded document awaiting extraction.
#[derive(Debug, Clone)]
pub struct Document {
    pub bytes: Bytes,
    pub format: DocumentFormat,
    pub source_name: String,
}

impl Document {
    pub fn new(bytes: impl Into<Bytes>, format: DocumentFormat, source_name: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            format,
            source_name: source_name.into(),
        }
    }

    /// Extract the document's text.
    pub fn extract(&self) -> Extraction {
        let extraction = extract(&self.bytes, self.format);
        if let Some(note) = &extraction.note {
            warn!(source = %self.source_name, format = %self.format, "Text extraction degraded: {}", note);
        }
        extraction
    }
}

/// Result of an extraction: the recovered text plus, when something went
/// wrong, a note describing what was lost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub note: Option<String>,
}

impl Extraction {
    pub fn complete(text: String) -> Self {
        Self { text, note: None }
    }

    pub fn degraded(text: String, note: impl Into<String>) -> Self {
        Self {
            text,
            note: Some(note.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is_degraded(&self) -> bool {
        self.note.is_some()
    }
}

/// Extract text from `bytes` according to `format`.
///
/// Never fails: a partially readable document yields the text gathered so
/// far, an unreadable one yields an empty string. Either way `note` says why.
pub fn extract(bytes: &[u8], format: DocumentFormat) -> Extraction {
    debug!(format = %format, size = bytes.len(), "Extracting text");
    match format {
        DocumentFormat::Text => extract_text(bytes),
        DocumentFormat::Pdf => pdf::extract(bytes),
        DocumentFormat::Docx => docx::extract(bytes),
    }
}

fn extract_text(bytes: &[u8]) -> Extraction {
    match std::str::from_utf8(bytes) {
        Ok(text) => Extraction::complete(text.to_string()),
        Err(e) => Extraction::degraded(String::new(), format!("Invalid UTF-8 text: {}", e)),
    }
}
