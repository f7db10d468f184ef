//! Transcript entries and the formatter that flattens them for the summarizer.
//!
//! Each message becomes one line:
//!
//! ```text
//! Message #3 | ada | sounds good [Replying to Message #1] [Reactions: 👍(2)] | 2025-01-01 10:05:00 UTC
//! ```
//!
//! Messages separated by more than the configured threshold get a
//! [`TIME_GAP_MARKER`] line between them. Attachments and embeds follow their
//! message on lines of their own. When the formatted text would not fit
//! under the token ceiling the oldest messages are dropped first.

use crate::TokenEstimator;
use chrono::{DateTime, Utc};
use digest_error::AdmissionError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// Line inserted between messages separated by a long silence.
pub const TIME_GAP_MARKER: &str = "--- TIME GAP ---";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// An emoji reaction attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reaction {
    /// Emoji text or `:name:` for custom emoji
    pub emoji: String,
    /// Number of users who reacted
    pub count: u32,
}

/// A name/value pair inside an [`Embed`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmbedField {
    /// Field label
    pub name: String,
    /// Field body
    pub value: String,
}

/// Rich content a bot or link preview attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Embed {
    /// Embed title
    #[serde(default)]
    pub title: Option<String>,
    /// Embed body text
    #[serde(default)]
    pub description: Option<String>,
    /// Link the title points to
    #[serde(default)]
    pub url: Option<String>,
    /// Structured fields in display order
    #[serde(default)]
    pub fields: Vec<EmbedField>,
    /// Image URL
    #[serde(default)]
    pub image: Option<String>,
    /// Video URL
    #[serde(default)]
    pub video: Option<String>,
    /// Thumbnail URL
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl Embed {
    /// Labelled parts in display order. Empty when the embed carries nothing.
    fn parts(&self) -> Vec<String> {
        let mut parts = Vec::new();
        let labelled = [
            ("Title", &self.title),
            ("Description", &self.description),
            ("URL", &self.url),
        ];
        for (label, value) in labelled {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                parts.push(format!("{}: {}", label, value));
            }
        }
        for field in &self.fields {
            parts.push(format!("{}: {}", field.name, field.value));
        }
        let media = [
            ("Image", &self.image),
            ("Video", &self.video),
            ("Thumbnail", &self.thumbnail),
        ];
        for (label, value) in media {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                parts.push(format!("{}: {}", label, value));
            }
        }
        parts
    }
}

/// One chat message as fetched from the channel.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use digest_core::TranscriptEntry;
///
/// let entry = TranscriptEntry::builder()
///     .id(1u64)
///     .author_id(42u64)
///     .author_display_name("ada")
///     .content("hello")
///     .timestamp(Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap())
///     .build()
///     .unwrap();
///
/// assert_eq!(entry.author_display_name(), "ada");
/// assert!(entry.reactions().is_empty());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_builder::Builder,
    derive_getters::Getters,
)]
#[builder(setter(into))]
pub struct TranscriptEntry {
    /// Platform message id
    id: u64,
    /// Platform user id of the author
    author_id: u64,
    /// Display name shown in the transcript
    author_display_name: String,
    /// Message text
    #[builder(default)]
    #[serde(default)]
    content: String,
    /// When the message was posted
    timestamp: DateTime<Utc>,
    /// Id of the message this one replies to
    #[builder(default)]
    #[serde(default)]
    reply_to: Option<u64>,
    /// Reactions on the message
    #[builder(default)]
    #[serde(default)]
    reactions: Vec<Reaction>,
    /// Attachment file names
    #[builder(default)]
    #[serde(default)]
    attachments: Vec<String>,
    /// Embeds on the message
    #[builder(default)]
    #[serde(default)]
    embeds: Vec<Embed>,
}

impl TranscriptEntry {
    /// Creates a new entry builder.
    pub fn builder() -> TranscriptEntryBuilder {
        TranscriptEntryBuilder::default()
    }
}

/// Result of formatting a transcript.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct FormattedTranscript {
    /// Flat text block
    text: String,
    /// Number of messages that made it into the text
    included: usize,
    /// Number of oldest messages dropped to fit the ceiling
    dropped: usize,
    /// Token estimate of `text`
    estimated_tokens: u64,
}

/// Turns chronological entries into the summarizer's input text.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct TranscriptFormatter {
    /// Gaps strictly longer than this get a marker line
    time_gap_threshold: Duration,
    /// Upper bound on the estimated tokens of the output
    token_ceiling: Option<u64>,
}

impl TranscriptFormatter {
    /// Create a formatter with no token ceiling.
    pub fn new(time_gap_threshold: Duration) -> Self {
        Self {
            time_gap_threshold,
            token_ceiling: None,
        }
    }

    /// Limit the estimated size of the output.
    pub fn with_token_ceiling(mut self, ceiling: u64) -> Self {
        self.token_ceiling = Some(ceiling);
        self
    }

    /// Format `entries`, dropping the oldest ones if the text would exceed the ceiling.
    ///
    /// The result for the surviving entries is exactly what formatting those
    /// entries alone would produce, so re-formatting is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates estimator failures.
    #[instrument(skip(self, entries, estimator), fields(entries = entries.len()))]
    pub fn format(
        &self,
        entries: &[TranscriptEntry],
        estimator: &dyn TokenEstimator,
    ) -> Result<FormattedTranscript, AdmissionError> {
        let Some(ceiling) = self.token_ceiling else {
            let text = self.render(entries);
            let estimated_tokens = estimator.estimate(&text)?;
            return Ok(FormattedTranscript {
                text,
                included: entries.len(),
                dropped: 0,
                estimated_tokens,
            });
        };

        // Dropping a message lengthens replies to it, so suffix size is not
        // monotonic in the start index. Take the first start that fits.
        let mut first = entries.len();
        for start in 0..entries.len() {
            let text = self.render(&entries[start..]);
            if estimator.estimate(&text)? <= ceiling {
                first = start;
                break;
            }
        }

        let text = self.render(&entries[first..]);
        let estimated_tokens = estimator.estimate(&text)?;
        if first > 0 {
            debug!(
                dropped = first,
                kept = entries.len() - first,
                estimated_tokens,
                ceiling,
                "Dropped oldest messages to fit token ceiling"
            );
        }

        Ok(FormattedTranscript {
            text,
            included: entries.len() - first,
            dropped: first,
            estimated_tokens,
        })
    }

    /// Render entries without any truncation.
    pub fn render(&self, entries: &[TranscriptEntry]) -> String {
        let numbers: HashMap<u64, usize> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.id, i + 1))
            .collect();

        let mut lines = Vec::with_capacity(entries.len());
        let mut previous: Option<&DateTime<Utc>> = None;

        for (i, entry) in entries.iter().enumerate() {
            if previous.is_some_and(|prev| self.is_gap(prev, &entry.timestamp)) {
                lines.push(TIME_GAP_MARKER.to_string());
            }

            let number = i + 1;
            lines.push(Self::render_entry(entry, number, &numbers));
            for attachment in &entry.attachments {
                lines.push(format!(
                    "[Attachment from Message #{} by {}: {}]",
                    number, entry.author_display_name, attachment
                ));
            }
            for embed in &entry.embeds {
                let parts = embed.parts();
                if parts.is_empty() {
                    continue;
                }
                lines.push(format!(
                    "[Embed from Message #{} by {}: {}]",
                    number,
                    entry.author_display_name,
                    parts.join(" | ")
                ));
            }

            previous = Some(&entry.timestamp);
        }

        lines.join("\n")
    }

    /// Out-of-order timestamps never count as a gap.
    fn is_gap(&self, previous: &DateTime<Utc>, current: &DateTime<Utc>) -> bool {
        (*current - *previous)
            .to_std()
            .map(|gap| gap > self.time_gap_threshold)
            .unwrap_or(false)
    }

    fn render_entry(
        entry: &TranscriptEntry,
        number: usize,
        numbers: &HashMap<u64, usize>,
    ) -> String {
        let content = if entry.content.is_empty() {
            "[No text content]"
        } else {
            entry.content.as_str()
        };

        let reply = match entry.reply_to {
            Some(id) => match numbers.get(&id) {
                Some(n) => format!(" [Replying to Message #{}]", n),
                None => " [Replying to message outside conversation]".to_string(),
            },
            None => String::new(),
        };

        let reactions = if entry.reactions.is_empty() {
            String::new()
        } else {
            let parts: Vec<String> = entry
                .reactions
                .iter()
                .map(|r| format!("{}({})", r.emoji, r.count))
                .collect();
            format!(" [Reactions: {}]", parts.join(", "))
        };

        format!(
            "Message #{} | {} | {}{}{} | {}",
            number,
            entry.author_display_name,
            content,
            reply,
            reactions,
            entry.timestamp.format(TIMESTAMP_FORMAT)
        )
    }
}
