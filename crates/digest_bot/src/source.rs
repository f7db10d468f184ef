//! Channel history read from a JSON export.

use async_trait::async_trait;
use digest_core::TranscriptEntry;
use digest_error::{DigestResult, TranscriptError, TranscriptErrorKind};
use digest_interface::ChannelHistory;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, instrument};

/// Accepted export layouts: a bare array or an object with a `messages` array.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExportFile {
    List(Vec<TranscriptEntry>),
    Export { messages: Vec<TranscriptEntry> },
}

/// A channel history held in memory, loaded from a JSON export.
///
/// Entries may appear in any order in the file; they are served newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonTranscriptSource {
    /// Newest first.
    entries: Vec<TranscriptEntry>,
}

impl JsonTranscriptSource {
    /// Wrap entries already in memory.
    pub fn from_entries(mut entries: Vec<TranscriptEntry>) -> Self {
        entries.sort_by(|a, b| {
            b.timestamp()
                .cmp(a.timestamp())
                .then_with(|| b.id().cmp(a.id()))
        });
        Self { entries }
    }

    /// Parse an export from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` if the text is not a valid export.
    pub fn from_json(text: &str) -> Result<Self, TranscriptError> {
        let file: ExportFile = serde_json::from_str(text)
            .map_err(|e| TranscriptError::new(TranscriptErrorKind::Malformed(e.to_string())))?;
        let entries = match file {
            ExportFile::List(entries) => entries,
            ExportFile::Export { messages } => messages,
        };
        Ok(Self::from_entries(entries))
    }

    /// Read an export from disk.
    ///
    /// # Errors
    ///
    /// Returns `Read` if the file cannot be read and `Malformed` if it cannot
    /// be parsed.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TranscriptError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            TranscriptError::new(TranscriptErrorKind::Read(format!(
                "{}: {}",
                path.as_ref().display(),
                e
            )))
        })?;
        let source = Self::from_json(&text)?;
        debug!(entries = source.len(), "Loaded transcript");
        Ok(source)
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the export had no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ChannelHistory for JsonTranscriptSource {
    async fn fetch_recent(&self, limit: usize) -> DigestResult<Vec<TranscriptEntry>> {
        Ok(self.entries.iter().take(limit).cloned().collect())
    }
}
