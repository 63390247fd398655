//! Declared document formats

use serde::{Deserialize, Serialize};
use std::fmt;

/// Format of an uploaded document, inferred from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Plain UTF-8 text (`.txt`)
    Text,
    /// Portable Document Format (`.pdf`)
    Pdf,
    /// Office Open XML word-processing document (`.docx`)
    Docx,
}

impl DocumentFormat {
    /// All supported formats.
    pub const ALL: [DocumentFormat; 3] = [DocumentFormat::Text, DocumentFormat::Pdf, DocumentFormat::Docx];

    /// Map a bare extension (without the dot) to a format, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(ext))
    }

    /// Map a file name to a format using its last `.`-separated suffix.
    ///
    /// Names without a suffix have no format.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Text => "txt",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}
