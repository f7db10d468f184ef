//! Admission errors raised by the rate limiting gate.

use std::time::Duration;

/// The three quota windows enforced against the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum QuotaKind {
    /// Requests per rolling minute
    #[display("requests per minute")]
    RequestsPerMinute,
    /// Estimated tokens per rolling minute
    #[display("tokens per minute")]
    TokensPerMinute,
    /// Requests per rolling day
    #[display("requests per day")]
    RequestsPerDay,
}

impl QuotaKind {
    /// All windows, in the order they are evaluated.
    pub const ALL: [QuotaKind; 3] = [
        QuotaKind::RequestsPerMinute,
        QuotaKind::TokensPerMinute,
        QuotaKind::RequestsPerDay,
    ];
}

/// Conditions under which a request is not admitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum AdmissionErrorKind {
    /// The request alone is larger than the window can ever hold.
    #[display(
        "Request needs {} but the {} window only holds {}",
        requested,
        window,
        capacity
    )]
    RequestTooLarge {
        /// Window that can never fit the request
        window: QuotaKind,
        /// Amount the request needs
        requested: u64,
        /// Usable capacity of the window (limit minus buffer)
        capacity: u64,
    },
    /// The prompt does not fit under the model's input token ceiling.
    #[display(
        "Request needs {} tokens but the input ceiling is {}",
        requested,
        ceiling
    )]
    ContextTooLarge {
        /// Estimated prompt tokens
        requested: u64,
        /// Configured input token ceiling
        ceiling: u64,
    },
    /// Temporarily out of quota.
    #[display("Rate limited on {}, retry after {:?}", window, retry_after)]
    RateLimited {
        /// Window that is currently exhausted
        window: QuotaKind,
        /// Lower bound on how long until capacity frees up
        retry_after: Duration,
    },
    /// No token estimate could be produced.
    #[display("Token estimation unavailable: {}", _0)]
    EstimationUnavailable(String),
}

impl AdmissionErrorKind {
    /// Whether waiting and retrying the same request can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdmissionErrorKind::RateLimited { .. })
    }
}

/// Admission error with location tracking.
///
/// # Examples
///
/// ```
/// use digest_error::{AdmissionError, AdmissionErrorKind, QuotaKind};
///
/// let err = AdmissionError::new(AdmissionErrorKind::RequestTooLarge {
///     window: QuotaKind::TokensPerMinute,
///     requested: 300_000,
///     capacity: 240_000,
/// });
/// assert!(!err.kind.is_retryable());
/// assert!(format!("{}", err).contains("tokens per minute"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Admission Error: {} at line {} in {}", kind, line, file)]
pub struct AdmissionError {
    /// The kind of error that occurred
    pub kind: AdmissionErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl AdmissionError {
    /// Create a new admission error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: AdmissionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
