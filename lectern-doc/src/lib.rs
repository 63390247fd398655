//! lectern-doc: Text extraction for uploaded documents
//!
//! Turns raw document bytes into best-effort plain text:
//! - Plain UTF-8 text files
//! - PDF documents, page by page
//! - Word-processor (.docx) documents, paragraph by paragraph
//!
//! Extraction never fails. Whatever goes wrong is reported as a diagnostic
//! note next to the text that could be recovered.

pub mod extractor;
pub mod format;

mod docx;
mod pdf;

pub use extractor::{extract, Document, Extraction};
pub use format::DocumentFormat;
