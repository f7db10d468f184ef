//! Trait definitions for summarizer backends and history sources.

use async_trait::async_trait;
use digest_core::{SummaryRequest, SummaryResponse, TranscriptEntry};
use digest_error::{AdmissionError, AdmissionErrorKind, DigestResult};

/// Remote API that turns a transcript into a summary.
///
/// Callers must obtain admission from the rate limiter before calling
/// [`summarize`](Self::summarize).
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Produce a summary for the request.
    async fn summarize(&self, req: &SummaryRequest) -> DigestResult<SummaryResponse>;

    /// Count the input tokens of a request with the backend's tokenizer.
    ///
    /// Backends without a counting endpoint report `EstimationUnavailable`,
    /// and callers fall back to a local estimate.
    async fn count_tokens(&self, req: &SummaryRequest) -> DigestResult<u64> {
        let _ = req;
        Err(AdmissionError::new(AdmissionErrorKind::EstimationUnavailable(format!(
            "{} does not count tokens",
            self.model_name()
        )))
        .into())
    }

    /// Model identifier (e.g., "gemini-2.5-flash-lite").
    fn model_name(&self) -> &str;
}

/// Source of recent channel messages.
#[async_trait]
pub trait ChannelHistory: Send + Sync {
    /// Up to `limit` of the most recent messages, newest first.
    async fn fetch_recent(&self, limit: usize) -> DigestResult<Vec<TranscriptEntry>>;
}
