//! Choosing which messages to summarize.
//!
//! History sources return messages newest first. Everything here hands back
//! chronological order, ready for the formatter.

use digest_core::TranscriptEntry;
use digest_error::{SettingsError, SettingsErrorKind};
use tracing::{debug, info};

/// Messages starting with this prefix are bot commands.
pub const DEFAULT_COMMAND_PREFIX: &str = "!";

/// Which slice of the channel history to summarize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSelection {
    /// The most recent `n` messages
    Latest(usize),
    /// Everything since this user last posted a non-command message
    SinceUser(u64),
}

/// Check that an explicit message count is within bounds.
///
/// # Errors
///
/// Returns `MessageCountOutOfRange` when `count` is outside `min..=max`.
pub fn validate_message_count(count: usize, min: usize, max: usize) -> Result<usize, SettingsError> {
    if count < min || count > max {
        return Err(SettingsError::new(SettingsErrorKind::MessageCountOutOfRange {
            requested: count,
            min,
            max,
        }));
    }
    Ok(count)
}

/// The `count` most recent messages, oldest first.
pub fn latest(mut newest_first: Vec<TranscriptEntry>, count: usize) -> Vec<TranscriptEntry> {
    newest_first.truncate(count);
    newest_first.reverse();
    newest_first
}

/// Messages posted since `user_id` last said something that was not a command.
///
/// Walks back through at most `limit` messages. The user's own last message
/// is not included. If the user never spoke within `limit`, everything
/// collected is returned.
pub fn since_last_activity(
    newest_first: Vec<TranscriptEntry>,
    user_id: u64,
    limit: usize,
    command_prefix: &str,
) -> Vec<TranscriptEntry> {
    let mut collected = Vec::new();
    let mut found = false;

    for entry in newest_first.into_iter().take(limit) {
        if *entry.author_id() == user_id && !entry.content().starts_with(command_prefix) {
            debug!(timestamp = %entry.timestamp(), "Found user's last non-command message");
            found = true;
            break;
        }
        collected.push(entry);
    }

    if !found {
        info!(
            limit,
            "User's previous activity not found, using all collected messages"
        );
    }

    collected.reverse();
    collected
}
