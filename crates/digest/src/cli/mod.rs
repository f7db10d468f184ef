//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the digest binary.

mod commands;
mod inspect;
mod summarize;

pub use commands::{Cli, Commands, SummarizeArgs};
pub use inspect::{privacy_hash, show_config, show_limits};
pub use summarize::run_summarize;
