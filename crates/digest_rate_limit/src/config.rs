//! Administrative quota limits.
//!
//! Each window has a nominal `limit` (what the provider publishes) and a
//! `buffer` held back as a safety margin. Only `limit - buffer` is ever handed
//! out.
//!
//! ```toml
//! [limits.requests_per_minute]
//! limit = 15
//! buffer = 1
//!
//! [limits.tokens_per_minute]
//! limit = 250_000
//! buffer = 10_000
//!
//! [limits.requests_per_day]
//! limit = 1_000
//! buffer = 50
//! ```

use crate::Tier;
use digest_error::{QuotaKind, SettingsError, SettingsErrorKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MINUTE: Duration = Duration::from_secs(60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Length of the rolling window for a quota.
pub fn window_duration(kind: QuotaKind) -> Duration {
    match kind {
        QuotaKind::RequestsPerMinute | QuotaKind::TokensPerMinute => MINUTE,
        QuotaKind::RequestsPerDay => DAY,
    }
}

/// Limit and safety buffer for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuotaLimit {
    /// Nominal limit published by the provider
    pub limit: u64,
    /// Amount held back from the limit
    #[serde(default)]
    pub buffer: u64,
}

impl QuotaLimit {
    /// Create a limit with the given buffer.
    pub const fn new(limit: u64, buffer: u64) -> Self {
        Self { limit, buffer }
    }

    /// Capacity actually handed out: `limit - buffer`.
    pub fn effective(&self) -> u64 {
        self.limit.saturating_sub(self.buffer)
    }

    /// Check that the buffer leaves some capacity.
    ///
    /// # Errors
    ///
    /// Returns `BufferNotBelowLimit` when `buffer >= limit`.
    #[track_caller]
    pub fn validate(&self, window: QuotaKind) -> Result<(), SettingsError> {
        if self.buffer >= self.limit {
            return Err(SettingsError::new(SettingsErrorKind::BufferNotBelowLimit {
                window: window.to_string(),
                limit: self.limit,
                buffer: self.buffer,
            }));
        }
        Ok(())
    }

    /// Derive a limit from a published value, holding back `1/share` of it (at least 1).
    fn with_buffer_share(limit: u64, share: u64) -> Self {
        let buffer = limit.div_ceil(share).max(1).min(limit.saturating_sub(1));
        Self::new(limit, buffer)
    }
}

/// Limits for all three windows.
///
/// Defaults match the Gemini Flash-Lite free tier with the safety margins the
/// bot has always used.
///
/// # Examples
///
/// ```
/// use digest_rate_limit::{ConfigurableLimits, QuotaKind};
///
/// let limits = ConfigurableLimits::default();
/// assert_eq!(limits.get(QuotaKind::RequestsPerMinute).effective(), 14);
/// assert_eq!(limits.get(QuotaKind::TokensPerMinute).effective(), 240_000);
/// assert_eq!(limits.get(QuotaKind::RequestsPerDay).effective(), 950);
/// assert!(limits.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigurableLimits {
    /// Requests per rolling minute
    pub requests_per_minute: QuotaLimit,
    /// Tokens per rolling minute
    pub tokens_per_minute: QuotaLimit,
    /// Requests per rolling day
    pub requests_per_day: QuotaLimit,
}

impl Default for ConfigurableLimits {
    fn default() -> Self {
        Self {
            requests_per_minute: QuotaLimit::new(15, 1),
            tokens_per_minute: QuotaLimit::new(250_000, 10_000),
            requests_per_day: QuotaLimit::new(1_000, 50),
        }
    }
}

impl ConfigurableLimits {
    /// Build limits from a provider tier.
    ///
    /// Quotas the tier does not enforce become effectively unlimited.
    pub fn from_tier(tier: &dyn Tier) -> Self {
        let unlimited = u64::from(u32::MAX);
        Self {
            requests_per_minute: QuotaLimit::with_buffer_share(
                tier.rpm().map(u64::from).unwrap_or(unlimited),
                25,
            ),
            tokens_per_minute: QuotaLimit::with_buffer_share(
                tier.tpm().unwrap_or(unlimited),
                25,
            ),
            // 5% held back on the daily window, 4% elsewhere.
            requests_per_day: QuotaLimit::with_buffer_share(
                tier.rpd().map(u64::from).unwrap_or(unlimited),
                20,
            ),
        }
    }

    /// Limit for one window.
    pub fn get(&self, kind: QuotaKind) -> QuotaLimit {
        match kind {
            QuotaKind::RequestsPerMinute => self.requests_per_minute,
            QuotaKind::TokensPerMinute => self.tokens_per_minute,
            QuotaKind::RequestsPerDay => self.requests_per_day,
        }
    }

    /// Replace the limit for one window without validating.
    pub fn set(&mut self, kind: QuotaKind, limit: QuotaLimit) {
        match kind {
            QuotaKind::RequestsPerMinute => self.requests_per_minute = limit,
            QuotaKind::TokensPerMinute => self.tokens_per_minute = limit,
            QuotaKind::RequestsPerDay => self.requests_per_day = limit,
        }
    }

    /// Validate every window.
    ///
    /// # Errors
    ///
    /// Returns the first window whose buffer is not below its limit.
    pub fn validate(&self) -> Result<(), SettingsError> {
        QuotaKind::ALL
            .iter()
            .try_for_each(|kind| self.get(*kind).validate(*kind))
    }
}
