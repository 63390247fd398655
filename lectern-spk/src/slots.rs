//! Fixed audio output slots
//!
//! Every synthesis replaces the whole content of one slot. Writes go to a
//! temporary file next to the slot and are renamed over it, so a reader sees
//! either the previous artifact or the new one, never a partial file.
//! Concurrent writers to the same slot are not ordered: the last rename wins.

use crate::error::SpeechError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Logical destination for the most recent artifact of one kind of request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotName {
    /// Audio for the most recent uploaded document
    Upload,
    /// Audio for the most recent "read text aloud" request
    Text,
    /// Audio for the most recent "read paragraph" request
    Paragraph,
}

impl SlotName {
    pub const ALL: [SlotName; 3] = [SlotName::Upload, SlotName::Text, SlotName::Paragraph];

    /// File name of the slot inside the storage root.
    pub fn file_name(&self) -> &'static str {
        match self {
            SlotName::Upload => "output.mp3",
            SlotName::Text => "text_output.mp3",
            SlotName::Paragraph => "paragraph_output.mp3",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotName::Upload => "upload",
            SlotName::Text => "text",
            SlotName::Paragraph => "paragraph",
        }
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The audio produced by one synthesis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    pub slot: SlotName,
    pub bytes: Bytes,
}

/// Slot files under a single storage root.
#[derive(Debug, Clone)]
pub struct SlotStore {
    root: PathBuf,
}

impl SlotStore {
    /// Open the store, creating the root directory if it does not exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, SpeechError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, slot: SlotName) -> PathBuf {
        self.root.join(slot.file_name())
    }

    /// Replace the slot's content with `bytes`.
    pub async fn write(&self, slot: SlotName, bytes: Bytes) -> Result<AudioArtifact, SpeechError> {
        let root = self.root.clone();
        let target = self.path(slot);
        let len = bytes.len();

        let data = bytes.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            // Same directory as the target so the rename stays on one filesystem
            let mut tmp = tempfile::NamedTempFile::new_in(&root)?;
            tmp.write_all(&data)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| SpeechError::Synthesizer(format!("Slot write task failed: {}", e)))??;

        debug!(slot = %slot, bytes = len, "Slot replaced");
        Ok(AudioArtifact { slot, bytes })
    }

    /// Current artifact in `slot`, or None if nothing was ever written there.
    pub async fn read(&self, slot: SlotName) -> Result<Option<AudioArtifact>, SpeechError> {
        match tokio::fs::read(self.path(slot)).await {
            Ok(bytes) => Ok(Some(AudioArtifact {
                slot,
                bytes: Bytes::from(bytes),
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
