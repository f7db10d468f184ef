//! The summarize pipeline: select, filter, format, estimate, admit, call.

use crate::selection::{self, DEFAULT_COMMAND_PREFIX, MessageSelection};
use crate::{PrivacyRegistry, SettingsStore};
use digest_core::{
    CharRatioEstimator, SummaryRequest, TokenEstimator, TokenUsage, TranscriptEntry,
    TranscriptFormatter,
};
use digest_error::{
    AdmissionError, AdmissionErrorKind, ConfigError, DigestResult, QuotaKind, TranscriptError,
    TranscriptErrorKind,
};
use digest_interface::{ChannelHistory, Summarizer};
use digest_rate_limit::RequestGate;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Times `prepare` re-formats when the final count overshoots the local estimate.
const FIT_ATTEMPTS: usize = 3;

/// A request ready to send, plus what went into it.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct PreparedSummary {
    /// Request for the summarizer
    request: SummaryRequest,
    /// Messages in the formatted transcript
    message_count: usize,
    /// Messages removed because their author opted out
    excluded_count: usize,
    /// Oldest messages dropped to fit the input ceiling
    dropped_count: usize,
    /// Tokens that will be reserved for the request
    estimated_tokens: u64,
}

/// Outcome of a completed summary.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct SummaryReport {
    /// Summary text
    summary: String,
    /// Messages that were summarized
    message_count: usize,
    /// Messages removed because their author opted out
    excluded_count: usize,
    /// Tokens reserved before the call
    estimated_tokens: u64,
    /// Usage reported by the API
    usage: Option<TokenUsage>,
}

/// Runs summaries through the rate limiter.
///
/// Settings are read fresh for every call, so changes made through the
/// [`SettingsStore`] apply to the next summary.
pub struct SummaryService {
    summarizer: Arc<dyn Summarizer>,
    settings: Arc<SettingsStore>,
    privacy: Arc<PrivacyRegistry>,
    estimator: Arc<dyn TokenEstimator>,
}

impl std::fmt::Debug for SummaryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryService")
            .field("model", &self.summarizer.model_name())
            .field("opted_out", &self.privacy.count())
            .finish_non_exhaustive()
    }
}

impl SummaryService {
    /// Create a service using the character-ratio token heuristic.
    pub fn new(
        summarizer: Arc<dyn Summarizer>,
        settings: Arc<SettingsStore>,
        privacy: Arc<PrivacyRegistry>,
    ) -> Self {
        Self {
            summarizer,
            settings,
            privacy,
            estimator: Arc::new(CharRatioEstimator::default()),
        }
    }

    /// Replace the local token estimator.
    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Settings shared with administrators.
    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    /// Opt-out registry.
    pub fn privacy(&self) -> &Arc<PrivacyRegistry> {
        &self.privacy
    }

    /// Fetch the messages a selection refers to, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `MessageCountOutOfRange` for a count outside the configured
    /// bounds, and propagates history failures.
    #[instrument(skip(self, history))]
    pub async fn collect(
        &self,
        history: &dyn ChannelHistory,
        selection: MessageSelection,
    ) -> DigestResult<Vec<TranscriptEntry>> {
        let config = self.settings.snapshot();
        match selection {
            MessageSelection::Latest(count) => {
                let count = selection::validate_message_count(
                    count,
                    config.min_messages,
                    config.max_messages_limit,
                )?;
                let recent = history.fetch_recent(count).await?;
                Ok(selection::latest(recent, count))
            }
            MessageSelection::SinceUser(user_id) => {
                let limit = config.max_messages_limit;
                let recent = history.fetch_recent(limit).await?;
                Ok(selection::since_last_activity(
                    recent,
                    user_id,
                    limit,
                    DEFAULT_COMMAND_PREFIX,
                ))
            }
        }
    }

    /// Build the request for `entries` and size it, without touching quota.
    ///
    /// `entries` must be in chronological order.
    ///
    /// # Errors
    ///
    /// - `Empty` if every message was filtered out.
    /// - `ContextTooLarge` if not even the newest message fits under the
    ///   input ceiling alongside the system prompt.
    #[instrument(skip_all, fields(entries = entries.len()))]
    pub async fn prepare(&self, entries: Vec<TranscriptEntry>) -> DigestResult<PreparedSummary> {
        let config = self.settings.snapshot();

        let total = entries.len();
        let kept: Vec<TranscriptEntry> = entries
            .into_iter()
            .filter(|entry| !self.privacy.is_opted_out(*entry.author_id()))
            .collect();
        let excluded_count = total - kept.len();
        if excluded_count > 0 {
            debug!(excluded_count, "Removed messages from opted-out users");
        }
        if kept.is_empty() {
            return Err(TranscriptError::new(TranscriptErrorKind::Empty).into());
        }

        let ceiling = config.input_token_ceiling;
        let prompt_tokens = self
            .estimator
            .estimate(&format!("{}\n", config.system_prompt))?;
        let mut budget = ceiling.saturating_sub(prompt_tokens);
        let mut requested = prompt_tokens;

        for _ in 0..FIT_ATTEMPTS {
            let formatter =
                TranscriptFormatter::new(config.time_gap_threshold()).with_token_ceiling(budget);
            let formatted = formatter.format(&kept, self.estimator.as_ref())?;

            if *formatted.included() == 0 {
                let newest = formatter.render(&kept[kept.len() - 1..]);
                let requested = prompt_tokens + self.estimator.estimate(&newest)?;
                warn!(
                    requested,
                    ceiling, "Newest message alone exceeds input ceiling"
                );
                return Err(AdmissionError::new(AdmissionErrorKind::ContextTooLarge {
                    requested,
                    ceiling,
                })
                .into());
            }

            let request = SummaryRequest::builder()
                .system_prompt(config.system_prompt.clone())
                .transcript(formatted.text().clone())
                .model(Some(config.model.clone()))
                .temperature(Some(config.temperature))
                .build()
                .map_err(|e| ConfigError::new(format!("Failed to build summary request: {}", e)))?;

            let estimated_tokens = self.estimate(&request).await;
            if estimated_tokens <= ceiling {
                return Ok(PreparedSummary {
                    request,
                    message_count: *formatted.included(),
                    excluded_count,
                    dropped_count: *formatted.dropped(),
                    estimated_tokens,
                });
            }

            // The final count disagrees with the local estimate. Shrink by the overshoot.
            debug!(
                estimated_tokens,
                ceiling, budget, "Prepared request over input ceiling, shrinking transcript"
            );
            requested = estimated_tokens;
            budget = budget.saturating_sub(estimated_tokens - ceiling);
            if budget == 0 {
                break;
            }
        }

        warn!(requested, ceiling, "Could not fit request under input ceiling");
        Err(AdmissionError::new(AdmissionErrorKind::ContextTooLarge { requested, ceiling }).into())
    }

    /// Summarize chronological `entries`, waiting for quota as needed.
    ///
    /// # Errors
    ///
    /// Everything [`prepare`](Self::prepare) returns, plus admission errors
    /// from the gate and summarizer failures.
    #[instrument(skip_all, fields(entries = entries.len()))]
    pub async fn summarize(&self, entries: Vec<TranscriptEntry>) -> DigestResult<SummaryReport> {
        let prepared = self.prepare(entries).await?;
        self.send(prepared).await
    }

    /// Admit a prepared request and call the summarizer.
    ///
    /// # Errors
    ///
    /// Returns admission errors from the gate and summarizer failures.
    #[instrument(skip_all, fields(estimated_tokens = prepared.estimated_tokens))]
    pub async fn send(&self, prepared: PreparedSummary) -> DigestResult<SummaryReport> {
        let controller = self.settings.controller().clone();
        let mut gate = RequestGate::new(controller.clone());
        if let Some(max_wait) = self.settings.snapshot().max_wait() {
            gate = gate.with_max_wait(max_wait);
        }

        let admission = gate.acquire(prepared.estimated_tokens).await?;
        debug!(
            waited_ms = admission.waited().as_millis() as u64,
            attempts = admission.attempts(),
            "Admitted"
        );

        let response = self.summarizer.summarize(&prepared.request).await?;

        if let Some(usage) = response.usage {
            controller.record_usage_correction(
                Instant::now(),
                prepared.estimated_tokens,
                *usage.total_tokens(),
            );
        }

        info!(
            messages = prepared.message_count,
            excluded = prepared.excluded_count,
            estimated_tokens = prepared.estimated_tokens,
            actual_tokens = response.usage.map(|u| *u.total_tokens()),
            "Summary generated"
        );

        Ok(SummaryReport {
            summary: response.text,
            message_count: prepared.message_count,
            excluded_count: prepared.excluded_count,
            estimated_tokens: prepared.estimated_tokens,
            usage: response.usage,
        })
    }

    /// Remote count first, then the local heuristic, then the whole window.
    async fn estimate(&self, request: &SummaryRequest) -> u64 {
        match self.summarizer.count_tokens(request).await {
            Ok(tokens) => {
                debug!(tokens, "Remote token count");
                return tokens;
            }
            Err(e) => warn!(error = %e, "Remote token count failed, using local estimate"),
        }

        let prompt = format!("{}\n{}", request.system_prompt(), request.transcript());
        match self.estimator.estimate(&prompt) {
            Ok(tokens) => tokens,
            Err(e) => {
                let capacity = self
                    .settings
                    .controller()
                    .limits()
                    .get(QuotaKind::TokensPerMinute)
                    .effective();
                warn!(error = %e, capacity, "No token estimate, charging full window");
                capacity
            }
        }
    }
}
