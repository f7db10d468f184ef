//! CLI command definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use digest_core::LogFormat;
use std::path::PathBuf;

/// Digest - rate-limited chat transcript summarization
#[derive(Parser, Debug)]
#[command(name = "digest")]
#[command(about = "Summarize chat transcripts with Gemini while staying inside API quotas", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log line format
    #[arg(long, global = true, default_value = "human")]
    pub log_format: LogFormatArg,

    /// Load this configuration file instead of the usual search path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize messages from a JSON transcript export
    Summarize(SummarizeArgs),

    /// Print configured limits and current window usage
    Limits,

    /// Print the effective configuration with privacy data redacted
    Config,

    /// Print the salted hash to add to `opted_out_users` for a user
    PrivacyHash {
        /// Platform user id
        #[arg(long)]
        user_id: u64,
    },
}

/// Arguments for `summarize`.
#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// Path to the JSON transcript export
    #[arg(long)]
    pub transcript: PathBuf,

    /// Number of most recent messages to summarize
    #[arg(long, conflicts_with = "since_user")]
    pub count: Option<usize>,

    /// Summarize everything since this user's last message
    #[arg(long)]
    pub since_user: Option<u64>,

    /// Print the prepared request and its token estimate without calling the API
    #[arg(long)]
    pub dry_run: bool,
}

/// Log format options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatArg {
    /// Human-readable format
    Human,
    /// One JSON object per line
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Human => LogFormat::Human,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}
