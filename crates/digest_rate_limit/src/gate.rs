//! Async admission on top of [`AdmissionController`].

use crate::{AdmissionController, AdmissionDecision};
use digest_error::{AdmissionError, AdmissionErrorKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

/// Proof that a request was admitted and its quota reserved.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct Admission {
    /// Tokens reserved in the per-minute token window
    estimated_tokens: u64,
    /// Total time spent sleeping before admission
    waited: Duration,
    /// Number of admission checks, including the successful one
    attempts: u32,
    /// When the reservation was recorded
    admitted_at: Instant,
}

/// Waits for quota before letting a request through.
///
/// Admission and reservation happen under the controller's lock, so
/// concurrent callers never both take the last unit of capacity. A caller
/// told to wait sleeps until the reported instant and then asks again from
/// scratch.
#[derive(Debug, Clone)]
pub struct RequestGate {
    controller: Arc<AdmissionController>,
    max_wait: Option<Duration>,
}

impl RequestGate {
    /// Create a gate that waits as long as needed.
    pub fn new(controller: Arc<AdmissionController>) -> Self {
        Self {
            controller,
            max_wait: None,
        }
    }

    /// Fail instead of sleeping when a single wait would exceed `max_wait`.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Shared controller.
    pub fn controller(&self) -> &Arc<AdmissionController> {
        &self.controller
    }

    /// Wait until `estimated_tokens` fits in every window, then reserve it.
    ///
    /// # Errors
    ///
    /// - `RequestTooLarge` if the request exceeds a window's capacity.
    /// - `RateLimited` if a wait would exceed the configured maximum.
    #[instrument(skip(self))]
    pub async fn acquire(&self, estimated_tokens: u64) -> Result<Admission, AdmissionError> {
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let now = Instant::now();
            match self.controller.try_admit(now, estimated_tokens) {
                AdmissionDecision::Granted => {
                    let waited = now.saturating_duration_since(started);
                    if !waited.is_zero() {
                        info!(
                            waited_ms = waited.as_millis() as u64,
                            attempts, "Admitted after waiting for quota"
                        );
                    }
                    return Ok(Admission {
                        estimated_tokens,
                        waited,
                        attempts,
                        admitted_at: now,
                    });
                }
                AdmissionDecision::Rejected(rejection) => {
                    return Err(rejection.into_error());
                }
                AdmissionDecision::MustWaitUntil { until, window } => {
                    let wait = until.saturating_duration_since(now);
                    if self.max_wait.is_some_and(|max| wait > max) {
                        return Err(AdmissionError::new(AdmissionErrorKind::RateLimited {
                            window,
                            retry_after: wait,
                        }));
                    }
                    debug!(
                        %window,
                        wait_ms = wait.as_millis() as u64,
                        attempts,
                        "Waiting for quota"
                    );
                    tokio::time::sleep_until(until).await;
                }
            }
        }
    }

    /// Admit and reserve now, or fail without sleeping.
    ///
    /// # Errors
    ///
    /// - `RequestTooLarge` if the request exceeds a window's capacity.
    /// - `RateLimited` carrying the wait if quota is exhausted.
    pub fn try_acquire(&self, estimated_tokens: u64) -> Result<Admission, AdmissionError> {
        let now = Instant::now();
        match self.controller.try_admit(now, estimated_tokens) {
            AdmissionDecision::Granted => Ok(Admission {
                estimated_tokens,
                waited: Duration::ZERO,
                attempts: 1,
                admitted_at: now,
            }),
            AdmissionDecision::Rejected(rejection) => Err(rejection.into_error()),
            AdmissionDecision::MustWaitUntil { until, window } => {
                Err(AdmissionError::new(AdmissionErrorKind::RateLimited {
                    window,
                    retry_after: until.saturating_duration_since(now),
                }))
            }
        }
    }
}
