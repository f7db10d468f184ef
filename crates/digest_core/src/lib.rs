//! Core data types for digest.
//!
//! This crate holds the pieces every other digest crate shares:
//! - [`TranscriptEntry`] and the [`TranscriptFormatter`] that turns a channel
//!   history into the text block sent to the summarizer
//! - [`TokenEstimator`] implementations used to size requests before admission
//! - [`SummaryRequest`] / [`SummaryResponse`] exchanged with model backends
//! - tracing subscriber setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod request;
mod telemetry;
mod token_counting;
mod transcript;

pub use request::{SummaryRequest, SummaryRequestBuilder, SummaryResponse};
pub use telemetry::{LogFormat, init_telemetry};
pub use token_counting::{CharRatioEstimator, TokenEstimator, TokenUsage};
pub use transcript::{
    Embed, EmbedField, FormattedTranscript, Reaction, TIME_GAP_MARKER, TranscriptEntry,
    TranscriptEntryBuilder, TranscriptFormatter,
};
