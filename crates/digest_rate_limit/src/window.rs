//! Rolling consumption log for a single quota.

use crate::QuotaLimit;
use digest_error::{AdmissionError, AdmissionErrorKind, QuotaKind};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// A request that can never fit in a window, however long it waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rejection {
    /// Window that cannot hold the request
    pub window: QuotaKind,
    /// Amount the request needs
    pub requested: u64,
    /// Usable capacity of the window
    pub capacity: u64,
}

impl Rejection {
    /// Convert into the `RequestTooLarge` admission error.
    #[track_caller]
    pub fn into_error(self) -> AdmissionError {
        AdmissionError::new(AdmissionErrorKind::RequestTooLarge {
            window: self.window,
            requested: self.requested,
            capacity: self.capacity,
        })
    }
}

/// Sliding-log tracker for one quota.
///
/// An entry recorded at `t` counts against the window while
/// `now - t < window_duration`. Expired entries are dropped from the front of
/// the log on every [`record`](Self::record), which keeps memory proportional
/// to the consumption inside one window.
#[derive(Debug, Clone)]
pub struct QuotaWindow {
    kind: QuotaKind,
    limit: QuotaLimit,
    window_duration: Duration,
    /// Sorted by timestamp.
    log: VecDeque<(Instant, u64)>,
}

impl QuotaWindow {
    /// Create an empty window.
    pub fn new(kind: QuotaKind, limit: QuotaLimit, window_duration: Duration) -> Self {
        Self {
            kind,
            limit,
            window_duration,
            log: VecDeque::new(),
        }
    }

    /// Which quota this window tracks.
    pub fn kind(&self) -> QuotaKind {
        self.kind
    }

    /// Current limit and buffer.
    pub fn limit(&self) -> QuotaLimit {
        self.limit
    }

    /// Length of the rolling window.
    pub fn window_duration(&self) -> Duration {
        self.window_duration
    }

    /// `limit - buffer`.
    pub fn effective_capacity(&self) -> u64 {
        self.limit.effective()
    }

    /// Change limit and buffer. Recorded consumption is kept as is.
    pub fn set_limit(&mut self, limit: QuotaLimit) {
        self.limit = limit;
    }

    /// Number of log entries currently held, expired ones included.
    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    fn is_active(&self, recorded_at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(recorded_at) < self.window_duration
    }

    fn active(&self, now: Instant) -> impl Iterator<Item = &(Instant, u64)> + '_ {
        self.log
            .iter()
            .filter(move |(recorded_at, _)| self.is_active(*recorded_at, now))
    }

    /// Sum of consumption still inside the window.
    pub fn used(&self, now: Instant) -> u64 {
        self.active(now)
            .fold(0u64, |sum, (_, amount)| sum.saturating_add(*amount))
    }

    /// Capacity left as of `now`. Negative when the window is over budget,
    /// which can happen after the limit is lowered.
    pub fn remaining_capacity(&self, now: Instant) -> i64 {
        let remaining = i128::from(self.effective_capacity()) - i128::from(self.used(now));
        remaining.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    /// How long until `needed` more units fit.
    ///
    /// Returns zero when they fit now. Otherwise walks the log oldest-first,
    /// adding up what each expiry frees, and returns the time until the entry
    /// that frees enough expires.
    ///
    /// # Errors
    ///
    /// Returns a [`Rejection`] when `needed` exceeds the effective capacity,
    /// since no amount of waiting can admit it.
    pub fn time_until_capacity(&self, now: Instant, needed: u64) -> Result<Duration, Rejection> {
        let capacity = self.effective_capacity();
        if needed > capacity {
            return Err(Rejection {
                window: self.kind,
                requested: needed,
                capacity,
            });
        }

        let remaining = i128::from(self.effective_capacity()) - i128::from(self.used(now));
        let needed = i128::from(needed);
        if remaining >= needed {
            return Ok(Duration::ZERO);
        }

        let mut available = remaining;
        for (recorded_at, amount) in self.active(now) {
            available += i128::from(*amount);
            if available >= needed {
                return Ok((*recorded_at + self.window_duration).saturating_duration_since(now));
            }
        }

        // Everything active expiring frees the full capacity, so the loop
        // always returns unless the log holds entries from the future.
        Ok(self.window_duration)
    }

    /// Record consumption at `now` and drop expired entries.
    pub fn record(&mut self, now: Instant, amount: u64) {
        self.prune(now);
        if amount == 0 {
            return;
        }

        let out_of_order = self.log.back().is_some_and(|(last, _)| *last > now);
        if out_of_order {
            let index = self.log.partition_point(|(recorded_at, _)| *recorded_at <= now);
            self.log.insert(index, (now, amount));
        } else {
            self.log.push_back((now, amount));
        }
    }

    /// Drop entries that can no longer count against the window.
    pub fn prune(&mut self, now: Instant) {
        while let Some((recorded_at, _)) = self.log.front() {
            if self.is_active(*recorded_at, now) {
                break;
            }
            self.log.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minute_window(limit: u64, buffer: u64) -> QuotaWindow {
        QuotaWindow::new(
            QuotaKind::RequestsPerMinute,
            QuotaLimit::new(limit, buffer),
            Duration::from_secs(60),
        )
    }

    #[test]
    fn test_empty_window_has_full_capacity() {
        let window = minute_window(15, 1);
        assert_eq!(window.remaining_capacity(Instant::now()), 14);
    }

    #[test]
    fn test_entries_expire_after_window() {
        let start = Instant::now();
        let mut window = minute_window(10, 0);
        window.record(start, 4);

        assert_eq!(window.remaining_capacity(start + Duration::from_secs(59)), 6);
        assert_eq!(window.remaining_capacity(start + Duration::from_secs(60)), 10);
    }

    #[test]
    fn test_wait_accumulates_freed_capacity() {
        let start = Instant::now();
        let mut window = QuotaWindow::new(
            QuotaKind::TokensPerMinute,
            QuotaLimit::new(100, 0),
            Duration::from_secs(60),
        );
        window.record(start, 30);
        window.record(start + Duration::from_secs(10), 30);
        window.record(start + Duration::from_secs(20), 40);

        let now = start + Duration::from_secs(30);
        // 0 left; 50 needs the first two entries to expire.
        assert_eq!(
            window.time_until_capacity(now, 50),
            Ok(Duration::from_secs(40))
        );
        assert_eq!(
            window.time_until_capacity(now, 30),
            Ok(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_oversized_request_is_rejected() {
        let window = minute_window(15, 1);
        let rejection = window
            .time_until_capacity(Instant::now(), 15)
            .unwrap_err();
        assert_eq!(rejection.capacity, 14);
        assert_eq!(rejection.requested, 15);
    }

    #[test]
    fn test_record_prunes_expired_entries() {
        let start = Instant::now();
        let mut window = minute_window(100, 0);
        for i in 0..10 {
            window.record(start + Duration::from_secs(i), 1);
        }
        window.record(start + Duration::from_secs(120), 1);
        assert_eq!(window.log_len(), 1);
    }

    #[test]
    fn test_out_of_order_record_keeps_log_sorted() {
        let start = Instant::now();
        let mut window = minute_window(12, 0);
        window.record(start + Duration::from_secs(20), 5);
        window.record(start + Duration::from_secs(10), 7);

        // The 7 recorded at t=10 expires first.
        let now = start + Duration::from_secs(20);
        assert_eq!(window.used(now), 12);
        assert_eq!(
            window.time_until_capacity(now, 7),
            Ok(Duration::from_secs(50))
        );
    }

    #[test]
    fn test_lowered_limit_goes_negative() {
        let start = Instant::now();
        let mut window = minute_window(10, 0);
        window.record(start, 8);
        window.set_limit(QuotaLimit::new(5, 0));
        assert_eq!(window.remaining_capacity(start), -3);
        assert_eq!(
            window.time_until_capacity(start, 1),
            Ok(Duration::from_secs(60))
        );
    }
}
