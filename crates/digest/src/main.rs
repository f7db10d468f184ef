//! Digest CLI binary.
//!
//! This binary provides command-line access to digest:
//! - Summarize a JSON transcript export
//! - Inspect configured limits and configuration
//! - Compute opt-out hashes

use clap::Parser;
use digest_bot::DigestConfig;
use digest_core::init_telemetry;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use cli::{Cli, Commands, privacy_hash, run_summarize, show_config, show_limits};

    // Load .env before anything reads GEMINI_API_KEY
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let directive = if cli.verbose { "debug" } else { "info" };
    init_telemetry(cli.log_format.into(), directive)?;

    let config = match &cli.config {
        Some(path) => DigestConfig::from_file(path)?,
        None => DigestConfig::load()?,
    };

    match cli.command {
        Commands::Summarize(args) => {
            run_summarize(config, args).await?;
        }

        Commands::Limits => {
            show_limits(&config)?;
        }

        Commands::Config => {
            show_config(&config)?;
        }

        Commands::PrivacyHash { user_id } => {
            privacy_hash(&config, user_id)?;
        }
    }

    Ok(())
}
