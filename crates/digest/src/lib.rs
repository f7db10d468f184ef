//! Digest - rate-limited chat transcript summarization
//!
//! Digest turns a chat channel's recent history into a short summary using the
//! Gemini API, while staying inside the provider's published quotas.
//!
//! # Features
//!
//! - **Admission control**: requests per minute, tokens per minute and
//!   requests per day are tracked on rolling windows; callers wait rather than
//!   get throttled by the provider
//! - **Transcript formatting**: numbered messages with replies, reactions,
//!   attachments and time gap markers
//! - **Privacy**: users can opt out; only salted hashes of their ids are kept
//! - **Retry**: transient HTTP failures are retried with exponential backoff
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use digest::{
//!     AdmissionController, DigestConfig, GeminiSummarizer, JsonTranscriptSource,
//!     MessageSelection, PrivacyRegistry, SettingsStore, SummaryService,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = DigestConfig::load()?;
//!     let controller = Arc::new(AdmissionController::new(config.limits)?);
//!     let summarizer = Arc::new(GeminiSummarizer::new(&config.model)?);
//!     let privacy = Arc::new(PrivacyRegistry::with_random_salt());
//!     let settings = Arc::new(SettingsStore::new(config, controller));
//!     let service = SummaryService::new(summarizer, settings, privacy);
//!
//!     let history = JsonTranscriptSource::from_path("channel.json")?;
//!     let entries = service.collect(&history, MessageSelection::Latest(50)).await?;
//!     let report = service.summarize(entries).await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `digest_error` - Error types
//! - `digest_core` - Transcript entries, formatting, token estimation
//! - `digest_interface` - `Summarizer` and `ChannelHistory` traits
//! - `digest_rate_limit` - Quota windows, admission controller, request gate
//! - `digest_models` - Gemini REST backend
//! - `digest_bot` - Configuration, settings, privacy and the summary service
//!
//! This crate (`digest`) re-exports everything for convenience.

pub use digest_bot::*;
pub use digest_core::*;
pub use digest_error::*;
pub use digest_interface::*;
pub use digest_models::*;
pub use digest_rate_limit::*;
