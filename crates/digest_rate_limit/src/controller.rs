//! Combines the three quota windows into one admission decision.

use crate::{ConfigurableLimits, QuotaLimit, QuotaWindow, Rejection, window_duration};
use digest_error::{QuotaKind, SettingsError};
use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Outcome of asking for admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// The request may be issued now.
    Granted,
    /// No capacity before `until`. This is a lower bound: re-check after waking.
    MustWaitUntil {
        /// Earliest instant at which every window could fit the request
        until: Instant,
        /// Window with the longest wait
        window: QuotaKind,
    },
    /// The request can never fit; shrink it instead of retrying.
    Rejected(Rejection),
}

/// Usage of one window at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_getters::Getters)]
pub struct WindowUsage {
    /// Which window
    kind: QuotaKind,
    /// Configured limit and buffer
    limit: QuotaLimit,
    /// Consumption still inside the window
    used: u64,
    /// `limit - buffer - used`
    remaining: i64,
}

#[derive(Debug)]
struct ControllerState {
    limits: ConfigurableLimits,
    /// Indexed in `QuotaKind::ALL` order.
    windows: [QuotaWindow; 3],
}

impl ControllerState {
    fn new(limits: ConfigurableLimits) -> Self {
        let windows = QuotaKind::ALL
            .map(|kind| QuotaWindow::new(kind, limits.get(kind), window_duration(kind)));
        Self { limits, windows }
    }

    fn needed(kind: QuotaKind, estimated_tokens: u64) -> u64 {
        match kind {
            QuotaKind::TokensPerMinute => estimated_tokens,
            QuotaKind::RequestsPerMinute | QuotaKind::RequestsPerDay => 1,
        }
    }

    fn window_mut(&mut self, kind: QuotaKind) -> &mut QuotaWindow {
        match kind {
            QuotaKind::RequestsPerMinute => &mut self.windows[0],
            QuotaKind::TokensPerMinute => &mut self.windows[1],
            QuotaKind::RequestsPerDay => &mut self.windows[2],
        }
    }

    fn evaluate(&self, now: Instant, estimated_tokens: u64) -> AdmissionDecision {
        let mut longest: Option<(Duration, QuotaKind)> = None;

        for window in &self.windows {
            let needed = Self::needed(window.kind(), estimated_tokens);
            match window.time_until_capacity(now, needed) {
                Err(rejection) => return AdmissionDecision::Rejected(rejection),
                Ok(wait) if wait.is_zero() => {}
                Ok(wait) => {
                    if longest.is_none_or(|(current, _)| wait > current) {
                        longest = Some((wait, window.kind()));
                    }
                }
            }
        }

        match longest {
            None => AdmissionDecision::Granted,
            Some((wait, window)) => AdmissionDecision::MustWaitUntil {
                until: now + wait,
                window,
            },
        }
    }

    fn commit(&mut self, now: Instant, estimated_tokens: u64) {
        for window in &mut self.windows {
            let amount = Self::needed(window.kind(), estimated_tokens);
            window.record(now, amount);
        }
    }
}

/// Shared admission state for all summarization requests.
///
/// A single mutex guards the three windows and the limits, so a decision is
/// computed atomically across windows and limit updates never interleave
/// with one. Share it with `Arc`.
///
/// # Examples
///
/// ```
/// use digest_rate_limit::{AdmissionController, AdmissionDecision, ConfigurableLimits};
/// use tokio::time::Instant;
///
/// let controller = AdmissionController::new(ConfigurableLimits::default()).unwrap();
/// let now = Instant::now();
///
/// assert_eq!(controller.try_admit(now, 5_000), AdmissionDecision::Granted);
/// assert!(matches!(
///     controller.try_admit(now, 500_000),
///     AdmissionDecision::Rejected(_)
/// ));
/// ```
#[derive(Debug)]
pub struct AdmissionController {
    state: Mutex<ControllerState>,
}

impl AdmissionController {
    /// Create a controller with empty windows.
    ///
    /// # Errors
    ///
    /// Returns an error if any buffer is not below its limit.
    #[instrument]
    pub fn new(limits: ConfigurableLimits) -> Result<Self, SettingsError> {
        limits.validate()?;
        debug!("Creating admission controller");
        Ok(Self {
            state: Mutex::new(ControllerState::new(limits)),
        })
    }

    /// Decide without reserving anything.
    ///
    /// Prefer [`try_admit`](Self::try_admit): a separate check followed by
    /// [`commit`](Self::commit) lets another caller slip in between.
    pub fn request_admission(&self, now: Instant, estimated_tokens: u64) -> AdmissionDecision {
        self.state.lock().evaluate(now, estimated_tokens)
    }

    /// Record one request and `estimated_tokens` tokens.
    ///
    /// Call only for requests that are actually issued.
    pub fn commit(&self, now: Instant, estimated_tokens: u64) {
        self.state.lock().commit(now, estimated_tokens);
    }

    /// Decide and, when granted, reserve the capacity in the same critical section.
    #[instrument(skip(self, now))]
    pub fn try_admit(&self, now: Instant, estimated_tokens: u64) -> AdmissionDecision {
        let mut state = self.state.lock();
        let decision = state.evaluate(now, estimated_tokens);
        match decision {
            AdmissionDecision::Granted => {
                state.commit(now, estimated_tokens);
                debug!("Admitted and reserved");
            }
            AdmissionDecision::MustWaitUntil { until, window } => {
                debug!(
                    %window,
                    wait_ms = until.saturating_duration_since(now).as_millis() as u64,
                    "Quota exhausted"
                );
            }
            AdmissionDecision::Rejected(rejection) => {
                warn!(
                    window = %rejection.window,
                    requested = rejection.requested,
                    capacity = rejection.capacity,
                    "Request can never fit"
                );
            }
        }
        decision
    }

    /// Account for usage the API reported beyond the estimate.
    ///
    /// Only the excess is recorded; over-estimates are not refunded.
    pub fn record_usage_correction(&self, now: Instant, estimated_tokens: u64, actual_tokens: u64) {
        let excess = actual_tokens.saturating_sub(estimated_tokens);
        if excess == 0 {
            return;
        }
        debug!(estimated_tokens, actual_tokens, excess, "Recording token usage above estimate");
        self.state
            .lock()
            .window_mut(QuotaKind::TokensPerMinute)
            .record(now, excess);
    }

    /// Replace all limits. Recorded consumption is untouched.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the current limits in place, if any buffer is
    /// not below its limit.
    #[instrument(skip(self))]
    pub fn update_limits(&self, limits: ConfigurableLimits) -> Result<(), SettingsError> {
        limits.validate()?;
        let mut state = self.state.lock();
        for kind in QuotaKind::ALL {
            state.window_mut(kind).set_limit(limits.get(kind));
        }
        state.limits = limits;
        info!("Rate limits updated");
        Ok(())
    }

    /// Current limits.
    pub fn limits(&self) -> ConfigurableLimits {
        self.state.lock().limits
    }

    /// Per-window usage as of `now`.
    pub fn snapshot(&self, now: Instant) -> Vec<WindowUsage> {
        let state = self.state.lock();
        state
            .windows
            .iter()
            .map(|window| WindowUsage {
                kind: window.kind(),
                limit: window.limit(),
                used: window.used(now),
                remaining: window.remaining_capacity(now),
            })
            .collect()
    }
}
