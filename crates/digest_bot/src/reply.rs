//! Splitting long summaries into chat-sized messages.

/// Largest chunk produced when splitting a long summary.
pub const DEFAULT_CHUNK_LENGTH: usize = 1900;

/// Longest single message the chat platform accepts.
pub const MESSAGE_LIMIT: usize = 2000;

/// Break points, best first.
const SPLIT_PATTERNS: [&str; 12] = [
    "\n\n", ". ", ".\n", "! ", "?\n", "? ", "!\n", "\n", "; ", ", ", " - ", " ",
];

/// Split `text` into chunks of at most `max_length` characters.
///
/// Each chunk ends at the best break point available, preferring paragraph
/// breaks over sentence ends over plain spaces, and falls back to a hard split.
/// Chunks are trimmed; text that already fits is returned untouched.
///
/// # Examples
///
/// ```
/// use digest_bot::smart_split;
///
/// let chunks = smart_split("First part. Second part.", 15);
/// assert_eq!(chunks, vec!["First part.", "Second part."]);
/// ```
pub fn smart_split(text: &str, max_length: usize) -> Vec<String> {
    let max_length = max_length.max(1);
    if text.chars().count() <= max_length {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while remaining.chars().count() > max_length {
        let split = best_split_point(remaining, max_length);
        let chunk = remaining[..split].trim_end();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        remaining = remaining[split..].trim_start();
    }

    let tail = remaining.trim();
    if !tail.is_empty() {
        chunks.push(tail.to_string());
    }
    chunks
}

/// Byte index to split at. `text` is longer than `max_length` characters.
fn best_split_point(text: &str, max_length: usize) -> usize {
    let window_end = text
        .char_indices()
        .nth(max_length)
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    let window = &text[..window_end];

    SPLIT_PATTERNS
        .iter()
        .find_map(|pattern| window.rfind(pattern).map(|index| index + pattern.len()))
        .unwrap_or(window_end)
}

/// Messages to post for a summary, with a header on the first one.
pub fn render_reply(summary: &str, message_count: usize) -> Vec<String> {
    let header = format!("**Summary of {} messages:**\n", message_count);

    if header.chars().count() + summary.chars().count() <= MESSAGE_LIMIT {
        return vec![format!("{}{}", header, summary)];
    }

    let mut messages = Vec::new();
    for (i, chunk) in smart_split(summary, DEFAULT_CHUNK_LENGTH)
        .into_iter()
        .enumerate()
    {
        if i == 0 {
            if header.chars().count() + chunk.chars().count() > MESSAGE_LIMIT {
                messages.push(header.trim_end().to_string());
                messages.push(chunk);
            } else {
                messages.push(format!("{}{}", header, chunk));
            }
        } else {
            messages.push(chunk);
        }
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(smart_split("  hi  ", 10), vec!["  hi  ".to_string()]);
    }

    #[test]
    fn test_paragraph_break_preferred() {
        let text = "Alpha beta.\n\nGamma, delta epsilon";
        let chunks = smart_split(text, 20);
        assert_eq!(chunks[0], "Alpha beta.");
        assert_eq!(chunks[1], "Gamma, delta epsilon");
    }

    #[test]
    fn test_hard_split_without_break_points() {
        let chunks = smart_split(&"x".repeat(25), 10);
        assert_eq!(chunks, vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
    }

    #[test]
    fn test_multibyte_text_splits_on_char_boundary() {
        let text = "é".repeat(15);
        let chunks = smart_split(&text, 10);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 10);
        assert_eq!(chunks[1].chars().count(), 5);
    }

    #[test]
    fn test_chunks_respect_limit() {
        let text = "word ".repeat(1000);
        for chunk in smart_split(&text, DEFAULT_CHUNK_LENGTH) {
            assert!(chunk.chars().count() <= DEFAULT_CHUNK_LENGTH);
        }
    }

    #[test]
    fn test_reply_header() {
        let reply = render_reply("Short summary.", 12);
        assert_eq!(reply, vec!["**Summary of 12 messages:**\nShort summary.".to_string()]);
    }

    #[test]
    fn test_long_reply_is_split() {
        let summary = "Sentence here. ".repeat(300);
        let reply = render_reply(&summary, 50);
        assert!(reply.len() > 1);
        assert!(reply[0].starts_with("**Summary of 50 messages:**\n"));
        assert!(reply.iter().all(|m| m.chars().count() <= MESSAGE_LIMIT));
    }
}
