//! Tests for transcript entry serialization.

use chrono::{TimeZone, Utc};
use digest_core::{Reaction, TranscriptEntry};

#[test]
fn test_minimal_entry_from_json() -> anyhow::Result<()> {
    let entry: TranscriptEntry = serde_json::from_str(
        r#"{
            "id": 5,
            "author_id": 42,
            "author_display_name": "ada",
            "timestamp": "2025-01-01T10:00:00Z"
        }"#,
    )?;

    assert_eq!(*entry.id(), 5);
    assert_eq!(entry.content(), "");
    assert_eq!(*entry.reply_to(), None);
    assert!(entry.reactions().is_empty());
    assert!(entry.attachments().is_empty());
    assert_eq!(
        *entry.timestamp(),
        Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()
    );
    Ok(())
}

#[test]
fn test_full_entry_from_json() -> anyhow::Result<()> {
    let entry: TranscriptEntry = serde_json::from_str(
        r#"{
            "id": 6,
            "author_id": 43,
            "author_display_name": "grace",
            "content": "see attached",
            "timestamp": "2025-01-01T10:01:30Z",
            "reply_to": 5,
            "reactions": [{ "emoji": "🎉", "count": 3 }],
            "attachments": ["notes.pdf"]
        }"#,
    )?;

    assert_eq!(*entry.reply_to(), Some(5));
    assert_eq!(
        entry.reactions(),
        &vec![Reaction {
            emoji: "🎉".to_string(),
            count: 3
        }]
    );
    assert_eq!(entry.attachments(), &vec!["notes.pdf".to_string()]);
    Ok(())
}

#[test]
fn test_builder_requires_author() {
    let result = TranscriptEntry::builder()
        .id(1u64)
        .timestamp(Utc::now())
        .build();
    assert!(result.is_err());
}
