//! PDF text extraction

use crate::extractor::Extraction;
use lopdf::Document;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

pub(crate) fn extract(bytes: &[u8]) -> Extraction {
    // lopdf panics on some malformed xref tables and content streams
    match panic::catch_unwind(AssertUnwindSafe(|| extract_pages(bytes))) {
        Ok(extraction) => extraction,
        Err(_) => Extraction::degraded(String::new(), "PDF parser panicked on malformed input"),
    }
}

fn extract_pages(bytes: &[u8]) -> Extraction {
    let doc = match Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(e) => return Extraction::degraded(String::new(), format!("Failed to parse PDF: {}", e)),
    };

    let pages = doc.get_pages();
    if pages.is_empty() {
        return Extraction::degraded(String::new(), "PDF has no pages");
    }

    let mut text = String::new();
    let mut failed_pages = Vec::new();

    // keyed by page number, so iteration is in reading order
    for (page_number, _) in pages {
        match doc.extract_text(&[page_number]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => {
                debug!(page = page_number, "No extractable text on page: {}", e);
                failed_pages.push(page_number);
            }
        }
    }

    if failed_pages.is_empty() {
        Extraction::complete(text)
    } else {
        let pages: Vec<String> = failed_pages.iter().map(|p| p.to_string()).collect();
        Extraction::degraded(text, format!("No text extracted from PDF page(s) {}", pages.join(", ")))
    }
}
