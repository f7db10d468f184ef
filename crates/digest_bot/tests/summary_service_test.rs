//! Tests for the summarize pipeline against a mock summarizer.

mod test_utils;

use digest_bot::{JsonTranscriptSource, MessageSelection, SummaryService};
use digest_core::{CharRatioEstimator, TokenEstimator};
use digest_error::{
    AdmissionErrorKind, DigestErrorKind, GeminiErrorKind, QuotaKind, SettingsErrorKind,
    TranscriptErrorKind,
};
use std::sync::Arc;
use std::time::Duration;
use test_utils::{MockSummarizer, conversation, entry, service_with};
use tokio::time::Instant;

fn used(service: &SummaryService, kind: QuotaKind) -> u64 {
    service
        .settings()
        .controller()
        .snapshot(Instant::now())
        .into_iter()
        .find(|usage| *usage.kind() == kind)
        .map(|usage| *usage.used())
        .expect("Every window is reported")
}

#[tokio::test]
async fn test_summarize_records_estimate_and_excess_usage() {
    let mock = Arc::new(
        MockSummarizer::new_success("Ada and Grace discussed lunch.")
            .with_token_count(1_200)
            .with_usage(1_200, 300),
    );
    let service = service_with(mock.clone());

    let report = service.summarize(conversation(6)).await.unwrap();

    assert_eq!(report.summary(), "Ada and Grace discussed lunch.");
    assert_eq!(*report.message_count(), 6);
    assert_eq!(*report.excluded_count(), 0);
    assert_eq!(*report.estimated_tokens(), 1_200);
    assert_eq!(report.usage().map(|u| *u.total_tokens()), Some(1_500));

    assert_eq!(mock.call_count(), 1);
    assert_eq!(mock.count_calls(), 1);
    assert_eq!(used(&service, QuotaKind::RequestsPerMinute), 1);
    assert_eq!(used(&service, QuotaKind::RequestsPerDay), 1);
    assert_eq!(used(&service, QuotaKind::TokensPerMinute), 1_500);
}

#[tokio::test]
async fn test_request_carries_configured_prompt_and_model() {
    let mock = Arc::new(MockSummarizer::new_success("summary").with_token_count(500));
    let service = service_with(mock.clone());

    service.summarize(conversation(5)).await.unwrap();

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.model().as_deref(), Some("gemini-2.5-flash-lite"));
    assert_eq!(*request.temperature(), Some(1.0));
    assert!(request.system_prompt().contains("chat summarizer"));
    assert!(request.transcript().starts_with("Message #1 | user2 | message number 1 |"));
    assert!(request.transcript().contains("Message #5 | user2 | message number 5 |"));
}

#[tokio::test]
async fn test_local_estimate_when_remote_count_fails() {
    let mock = Arc::new(MockSummarizer::new_success("summary"));
    let service = service_with(mock.clone());

    let report = service.summarize(conversation(8)).await.unwrap();

    let request = &mock.requests()[0];
    let expected = CharRatioEstimator::default()
        .estimate(&format!("{}\n{}", request.system_prompt(), request.transcript()))
        .unwrap();
    assert_eq!(*report.estimated_tokens(), expected);
    assert_eq!(used(&service, QuotaKind::TokensPerMinute), expected);
}

#[tokio::test]
async fn test_opted_out_authors_are_removed() {
    let mock = Arc::new(MockSummarizer::new_success("summary").with_token_count(300));
    let service = service_with(mock.clone());
    service.privacy().opt_out(2);

    let report = service.summarize(conversation(6)).await.unwrap();

    assert_eq!(*report.message_count(), 3);
    assert_eq!(*report.excluded_count(), 3);
    let transcript = mock.requests()[0].transcript().clone();
    assert!(!transcript.contains("user2"));
    assert!(transcript.contains("message number 2"));
}

#[tokio::test]
async fn test_nothing_left_after_filtering() {
    let mock = Arc::new(MockSummarizer::new_success("summary").with_token_count(300));
    let service = service_with(mock.clone());
    service.privacy().opt_out(1);
    service.privacy().opt_out(2);

    let err = service.summarize(conversation(6)).await.unwrap_err();

    match err.kind() {
        DigestErrorKind::Transcript(e) => assert_eq!(e.kind, TranscriptErrorKind::Empty),
        other => panic!("Expected transcript error, got {:?}", other),
    }
    assert_eq!(mock.count_calls(), 0);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_input_ceiling_rejects_before_admission() {
    let mock = Arc::new(MockSummarizer::new_success("summary").with_token_count(5_000));
    let service = service_with(mock.clone());
    service.settings().set("input_token_ceiling", "1000").unwrap();

    let err = service.summarize(conversation(6)).await.unwrap_err();

    let admission = err.as_admission().expect("Admission error");
    assert_eq!(
        admission.kind,
        AdmissionErrorKind::ContextTooLarge {
            requested: 5_000,
            ceiling: 1_000,
        }
    );
    assert!(format!("{}", err).contains("input ceiling"));
    assert_eq!(mock.call_count(), 0);
    assert_eq!(used(&service, QuotaKind::RequestsPerMinute), 0);
}

#[tokio::test]
async fn test_long_history_is_truncated_to_fit_with_system_prompt() {
    let mock = Arc::new(MockSummarizer::new_success("summary"));
    let service = service_with(mock.clone());
    service.settings().set("input_token_ceiling", "1000").unwrap();

    let prepared = service.prepare(conversation(200)).await.unwrap();

    assert!(*prepared.dropped_count() > 0);
    assert!(*prepared.message_count() > 0);
    assert_eq!(prepared.message_count() + prepared.dropped_count(), 200);
    assert!(*prepared.estimated_tokens() <= 1_000);
    assert!(prepared.request().transcript().contains("message number 200 "));

    let report = service.summarize(conversation(200)).await.unwrap();
    assert!(*report.estimated_tokens() <= 1_000);
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_newest_message_over_ceiling_is_rejected_before_admission() {
    let mock = Arc::new(MockSummarizer::new_success("summary").with_token_count(100));
    let service = service_with(mock.clone());
    service.settings().set("input_token_ceiling", "1000").unwrap();
    let huge = "x".repeat(20_000);

    let err = service
        .summarize(vec![entry(1, 1, &huge, 0)])
        .await
        .unwrap_err();

    let admission = err.as_admission().expect("Admission error");
    match admission.kind {
        AdmissionErrorKind::ContextTooLarge { requested, ceiling } => {
            assert_eq!(ceiling, 1_000);
            assert!(requested > 5_000);
        }
        ref other => panic!("Expected ContextTooLarge, got {:?}", other),
    }
    assert_eq!(mock.count_calls(), 0);
    assert_eq!(mock.call_count(), 0);
    assert_eq!(used(&service, QuotaKind::RequestsPerMinute), 0);
    assert_eq!(used(&service, QuotaKind::TokensPerMinute), 0);
}

#[tokio::test]
async fn test_oversized_for_token_window_is_rejected() {
    let mock = Arc::new(MockSummarizer::new_success("summary").with_token_count(5_000));
    let service = service_with(mock.clone());
    let settings = service.settings();
    settings.set("limits.tokens_per_minute.buffer", "100").unwrap();
    settings.set("limits.tokens_per_minute.limit", "2000").unwrap();

    let err = service.summarize(conversation(6)).await.unwrap_err();

    let admission = err.as_admission().expect("Admission error");
    assert!(!admission.kind.is_retryable());
    assert!(matches!(
        admission.kind,
        AdmissionErrorKind::RequestTooLarge {
            window: QuotaKind::TokensPerMinute,
            requested: 5_000,
            capacity: 1_900,
        }
    ));
    assert_eq!(mock.call_count(), 0);
    assert_eq!(used(&service, QuotaKind::TokensPerMinute), 0);
}

#[tokio::test(start_paused = true)]
async fn test_max_wait_turns_wait_into_rate_limited() {
    let mock = Arc::new(MockSummarizer::new_success("summary").with_token_count(100));
    let service = service_with(mock.clone());
    service.settings().set("limits.requests_per_minute.limit", "2").unwrap();
    service.settings().set("max_wait_secs", "0").unwrap();

    service.summarize(conversation(5)).await.unwrap();
    let err = service.summarize(conversation(5)).await.unwrap_err();

    let admission = err.as_admission().expect("Admission error");
    assert!(admission.kind.is_retryable());
    assert_eq!(
        admission.kind,
        AdmissionErrorKind::RateLimited {
            window: QuotaKind::RequestsPerMinute,
            retry_after: Duration::from_secs(60),
        }
    );
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_second_summary_waits_for_minute_window() {
    let mock = Arc::new(MockSummarizer::new_success("summary").with_token_count(100));
    let service = service_with(mock.clone());
    service.settings().set("limits.requests_per_minute.limit", "2").unwrap();

    let start = Instant::now();
    service.summarize(conversation(5)).await.unwrap();
    service.summarize(conversation(5)).await.unwrap();

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(60));
    assert!(elapsed < Duration::from_secs(61));
    assert_eq!(mock.call_count(), 2);
}

#[tokio::test]
async fn test_summarizer_failure_keeps_reservation() {
    let mock = Arc::new(
        MockSummarizer::new_error(GeminiErrorKind::HttpError {
            status_code: 400,
            message: "INVALID_ARGUMENT: bad request".to_string(),
        })
        .with_token_count(100),
    );
    let service = service_with(mock.clone());

    let err = service.summarize(conversation(5)).await.unwrap_err();

    assert!(matches!(err.kind(), DigestErrorKind::Gemini(_)));
    assert_eq!(used(&service, QuotaKind::RequestsPerMinute), 1);
}

#[tokio::test]
async fn test_prepare_does_not_touch_quota() {
    let mock = Arc::new(MockSummarizer::new_success("summary").with_token_count(700));
    let service = service_with(mock.clone());

    let prepared = service.prepare(conversation(10)).await.unwrap();

    assert_eq!(*prepared.estimated_tokens(), 700);
    assert_eq!(*prepared.message_count(), 10);
    assert_eq!(*prepared.dropped_count(), 0);
    assert_eq!(mock.call_count(), 0);
    assert_eq!(used(&service, QuotaKind::RequestsPerMinute), 0);
}

#[tokio::test]
async fn test_collect_latest() {
    let service = service_with(Arc::new(MockSummarizer::new_success("summary")));
    let history = JsonTranscriptSource::from_entries(conversation(8));

    let selected = service
        .collect(&history, MessageSelection::Latest(5))
        .await
        .unwrap();

    let ids: Vec<u64> = selected.iter().map(|e| *e.id()).collect();
    assert_eq!(ids, vec![4, 5, 6, 7, 8]);
}

#[tokio::test]
async fn test_collect_rejects_count_below_minimum() {
    let service = service_with(Arc::new(MockSummarizer::new_success("summary")));
    let history = JsonTranscriptSource::from_entries(conversation(8));

    let err = service
        .collect(&history, MessageSelection::Latest(3))
        .await
        .unwrap_err();

    match err.kind() {
        DigestErrorKind::Settings(e) => assert_eq!(
            e.kind,
            SettingsErrorKind::MessageCountOutOfRange {
                requested: 3,
                min: 5,
                max: 200,
            }
        ),
        other => panic!("Expected settings error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_collect_since_user() {
    let service = service_with(Arc::new(MockSummarizer::new_success("summary")));
    let history = JsonTranscriptSource::from_entries(vec![
        entry(1, 3, "before", 0),
        entry(2, 9, "my last message", 1),
        entry(3, 3, "reply one", 2),
        entry(4, 4, "reply two", 3),
        entry(5, 9, "!summarize", 4),
    ]);

    let selected = service
        .collect(&history, MessageSelection::SinceUser(9))
        .await
        .unwrap();

    let ids: Vec<u64> = selected.iter().map(|e| *e.id()).collect();
    assert_eq!(ids, vec![3, 4, 5]);
}
