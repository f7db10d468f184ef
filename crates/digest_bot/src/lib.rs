//! Summary service for digest.
//!
//! Wires the pieces together into the summarize pipeline:
//! 1. [`SummaryService::collect`] picks messages from a [`ChannelHistory`](digest_interface::ChannelHistory)
//! 2. opted-out authors are removed using the [`PrivacyRegistry`]
//! 3. the transcript is formatted and its token cost estimated
//! 4. the request waits at the rate limiter, then goes to the
//!    [`Summarizer`](digest_interface::Summarizer)
//!
//! Runtime settings live in a [`SettingsStore`] loaded from [`DigestConfig`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod privacy;
mod reply;
mod selection;
mod service;
mod settings;
mod source;

pub use config::{DEFAULT_CONFIG, DigestConfig};
pub use privacy::{PrivacyRegistry, generate_salt};
pub use reply::{DEFAULT_CHUNK_LENGTH, MESSAGE_LIMIT, render_reply, smart_split};
pub use selection::{
    DEFAULT_COMMAND_PREFIX, MessageSelection, latest, since_last_activity, validate_message_count,
};
pub use service::{PreparedSummary, SummaryReport, SummaryService};
pub use settings::SettingsStore;
pub use source::JsonTranscriptSource;
