//! lectern-server: HTTP service reading documents and text aloud
//!
//! Wires the text extractor and the speech synthesizer behind the
//! conversion orchestrator and exposes it over HTTP.

pub mod config;
pub mod conversion;
pub mod http;

pub use config::{ConfigError, LecternConfig};
pub use conversion::{ConversionError, ConversionOrchestrator, DocumentStore};
pub use http::{create_router, ApiState};
