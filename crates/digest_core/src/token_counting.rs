//! Token estimation and usage accounting.

use digest_error::AdmissionError;
use serde::{Deserialize, Serialize};

/// Token usage statistics reported for a single call.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct TokenUsage {
    /// Tokens in the prompt/input.
    prompt_tokens: u64,
    /// Tokens in the response/output.
    completion_tokens: u64,
    /// Total tokens (prompt + completion).
    total_tokens: u64,
}

impl TokenUsage {
    /// Create a new token usage record.
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Estimates the token volume of a prompt before it is sent.
///
/// Estimates feed admission decisions, so implementations should lean high
/// rather than low and grow with the input.
pub trait TokenEstimator: Send + Sync {
    /// Estimate how many tokens `text` will cost.
    ///
    /// # Errors
    ///
    /// Returns an `EstimationUnavailable` admission error when no estimate
    /// can be produced.
    fn estimate(&self, text: &str) -> Result<u64, AdmissionError>;
}

/// Character-count heuristic: `ceil(chars / chars_per_token) + overhead`.
///
/// Monotonic in input length by construction.
///
/// # Examples
///
/// ```
/// use digest_core::{CharRatioEstimator, TokenEstimator};
///
/// let estimator = CharRatioEstimator::default();
/// assert_eq!(estimator.estimate("").unwrap(), 16);
/// assert_eq!(estimator.estimate("abcde").unwrap(), 18);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_getters::Getters)]
pub struct CharRatioEstimator {
    chars_per_token: u64,
    overhead: u64,
}

impl CharRatioEstimator {
    /// Characters per token for English chat text.
    pub const DEFAULT_CHARS_PER_TOKEN: u64 = 4;
    /// Flat per-request allowance for framing tokens.
    pub const DEFAULT_OVERHEAD: u64 = 16;

    /// Create an estimator. A ratio of zero is treated as one.
    pub fn new(chars_per_token: u64, overhead: u64) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
            overhead,
        }
    }
}

impl Default for CharRatioEstimator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHARS_PER_TOKEN, Self::DEFAULT_OVERHEAD)
    }
}

impl TokenEstimator for CharRatioEstimator {
    fn estimate(&self, text: &str) -> Result<u64, AdmissionError> {
        let chars = text.chars().count() as u64;
        Ok(chars.div_ceil(self.chars_per_token) + self.overhead)
    }
}
