//! Trait definitions for the digest summarizer.
//!
//! Two seams separate the summarization pipeline from the outside world:
//! - [`Summarizer`] for the remote text generation API
//! - [`ChannelHistory`] for wherever the chat messages come from

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;

pub use traits::{ChannelHistory, Summarizer};
