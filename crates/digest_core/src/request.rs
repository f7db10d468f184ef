//! Request and response types exchanged with summarizer backends.

use crate::TokenUsage;
use serde::{Deserialize, Serialize};

/// A single summarization request.
///
/// # Examples
///
/// ```
/// use digest_core::SummaryRequest;
///
/// let request = SummaryRequest::builder()
///     .system_prompt("Summarize the conversation.")
///     .transcript("Message #1 | ada | hello | 2025-01-01 10:00:00 UTC")
///     .build()
///     .unwrap();
///
/// assert!(request.model().is_none());
/// assert_eq!(request.temperature(), &None);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_builder::Builder,
    derive_getters::Getters,
)]
#[builder(setter(into))]
pub struct SummaryRequest {
    /// Instructions for the model
    system_prompt: String,
    /// Formatted transcript to summarize
    transcript: String,
    /// Model override (backend default when `None`)
    #[builder(default)]
    model: Option<String>,
    /// Sampling temperature
    #[builder(default)]
    temperature: Option<f32>,
}

impl SummaryRequest {
    /// Creates a new request builder.
    pub fn builder() -> SummaryRequestBuilder {
        SummaryRequestBuilder::default()
    }
}

/// The summarizer's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    /// Summary text
    pub text: String,
    /// Usage reported by the API, when it reports any
    pub usage: Option<TokenUsage>,
}
