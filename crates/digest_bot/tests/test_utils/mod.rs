//! Test utilities for digest_bot tests.

pub mod mock_summarizer;

#[allow(unused_imports)]
pub use mock_summarizer::{MockBehavior, MockSummarizer};

use chrono::{DateTime, Duration, TimeZone, Utc};
use digest_bot::{DigestConfig, PrivacyRegistry, SettingsStore, SummaryService};
use digest_core::TranscriptEntry;
use digest_rate_limit::AdmissionController;
use std::sync::Arc;

/// Fixed start time for generated conversations.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

/// A message posted `minute` minutes after [`base_time`].
pub fn entry(id: u64, author: u64, content: &str, minute: i64) -> TranscriptEntry {
    TranscriptEntry::builder()
        .id(id)
        .author_id(author)
        .author_display_name(format!("user{}", author))
        .content(content)
        .timestamp(base_time() + Duration::minutes(minute))
        .build()
        .expect("Failed to build test entry")
}

/// `count` messages alternating between authors 1 and 2, oldest first.
pub fn conversation(count: u64) -> Vec<TranscriptEntry> {
    (1..=count)
        .map(|id| entry(id, 1 + id % 2, &format!("message number {}", id), id as i64))
        .collect()
}

/// A service over bundled defaults with the given summarizer.
#[allow(dead_code)]
pub fn service_with(mock: Arc<MockSummarizer>) -> SummaryService {
    let config = DigestConfig::bundled().expect("Bundled config is valid");
    let controller =
        Arc::new(AdmissionController::new(config.limits).expect("Bundled limits are valid"));
    let settings = Arc::new(SettingsStore::new(config, controller));
    let privacy = Arc::new(PrivacyRegistry::new("test-salt", Vec::new()));
    SummaryService::new(mock, settings, privacy)
}
