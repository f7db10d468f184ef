//! Summarizer backends for digest.
//!
//! Only Gemini is supported. [`GeminiSummarizer`] talks to the Generative
//! Language REST API directly and implements
//! [`Summarizer`](digest_interface::Summarizer).
//!
//! ```no_run
//! use digest_core::SummaryRequest;
//! use digest_interface::Summarizer;
//! use digest_models::GeminiSummarizer;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let summarizer = GeminiSummarizer::new("gemini-2.5-flash-lite")?;
//! let request = SummaryRequest::builder()
//!     .system_prompt("Summarize the conversation.")
//!     .transcript("Message #1 | ada | hello | 2025-01-01 10:00:00 UTC")
//!     .build()?;
//! let response = summarizer.summarize(&request).await?;
//! println!("{}", response.text);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod gemini;

pub use gemini::{
    Candidate, Content, CountTokensRequest, CountTokensResponse, DEFAULT_BASE_URL,
    GeminiSummarizer, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
    ThinkingConfig, UsageMetadata,
};
