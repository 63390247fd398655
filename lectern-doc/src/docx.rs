//! Word-processor (.docx) text extraction
//!
//! Only paragraphs that sit directly in the document body are read. Tables,
//! text boxes, headers, footers and comments live elsewhere in the tree (or in
//! other parts of the package) and are skipped, as is all styling.

use crate::extractor::Extraction;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";

pub(crate) fn extract(bytes: &[u8]) -> Extraction {
    let xml = match read_document_part(bytes) {
        Ok(xml) => xml,
        Err(note) => return Extraction::degraded(String::new(), note),
    };

    let mut collector = BodyCollector::default();
    let result = collector.run(&xml);
    let text = collector.finish();
    match result {
        Ok(()) => Extraction::complete(text),
        Err(e) => Extraction::degraded(text, format!("Malformed document XML: {}", e)),
    }
}

fn read_document_part(bytes: &[u8]) -> Result<String, String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| format!("Not a DOCX package: {}", e))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| format!("Missing {}: {}", DOCUMENT_PART, e))?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| format!("Failed to read {}: {}", DOCUMENT_PART, e))?;
    Ok(xml)
}

#[derive(Default)]
struct BodyCollector {
    /// Local names of the currently open elements
    stack: Vec<Vec<u8>>,
    paragraphs: Vec<String>,
    current: Option<String>,
}

impl BodyCollector {
    fn run(&mut self, xml: &str) -> Result<(), quick_xml::Error> {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.local_name().as_ref().to_vec();
                    if name == b"p" && self.parent_is_body() {
                        self.current = Some(String::new());
                    }
                    self.stack.push(name);
                }
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"p" if self.parent_is_body() => self.paragraphs.push(String::new()),
                    b"tab" => self.push_in_run('\t'),
                    b"br" | b"cr" => self.push_in_run('\n'),
                    _ => {}
                },
                Event::Text(t) => {
                    if self.in_text_run() {
                        let text = t.unescape()?;
                        if let Some(paragraph) = self.current.as_mut() {
                            paragraph.push_str(&text);
                        }
                    }
                }
                Event::End(_) => {
                    let closed = self.stack.pop();
                    if closed.as_deref() == Some(b"p".as_slice()) && self.parent_is_body() {
                        if let Some(paragraph) = self.current.take() {
                            self.paragraphs.push(paragraph);
                        }
                    }
                }
                Event::Eof => return Ok(()),
                _ => {}
            }
        }
    }

    /// Joined text, including any paragraph left open by a parse error.
    fn finish(mut self) -> String {
        if let Some(paragraph) = self.current.take() {
            self.paragraphs.push(paragraph);
        }
        self.paragraphs.join("\n")
    }

    fn parent_is_body(&self) -> bool {
        self.stack.last().map(Vec::as_slice) == Some(b"body".as_slice())
    }

    fn in_text_box(&self) -> bool {
        self.stack.iter().any(|name| name == b"txbxContent")
    }

    fn in_text_run(&self) -> bool {
        self.current.is_some()
            && self.stack.last().map(Vec::as_slice) == Some(b"t".as_slice())
            && !self.in_text_box()
    }

    fn push_in_run(&mut self, c: char) {
        let in_run = self.stack.last().map(Vec::as_slice) == Some(b"r".as_slice());
        if in_run && !self.in_text_box() {
            if let Some(paragraph) = self.current.as_mut() {
                paragraph.push(c);
            }
        }
    }
}
