//! Summarize command handler.

use crate::cli::SummarizeArgs;
use async_trait::async_trait;
use digest_bot::{
    DigestConfig, JsonTranscriptSource, MessageSelection, PrivacyRegistry, SettingsStore,
    SummaryService, render_reply,
};
use digest_core::{SummaryRequest, SummaryResponse};
use digest_error::{DigestResult, GeminiError, GeminiErrorKind};
use digest_interface::Summarizer;
use digest_models::GeminiSummarizer;
use digest_rate_limit::AdmissionController;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Stand-in used for dry runs without an API key. Counting falls back to the
/// local estimate and summarizing always fails.
struct OfflineSummarizer {
    model: String,
}

#[async_trait]
impl Summarizer for OfflineSummarizer {
    async fn summarize(&self, _req: &SummaryRequest) -> DigestResult<SummaryResponse> {
        Err(GeminiError::new(GeminiErrorKind::MissingApiKey).into())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn summarizer_for(config: &DigestConfig, dry_run: bool) -> DigestResult<Arc<dyn Summarizer>> {
    match GeminiSummarizer::new(config.model.clone()) {
        Ok(summarizer) => Ok(Arc::new(summarizer.with_temperature(config.temperature))),
        Err(e) if dry_run && e.kind == GeminiErrorKind::MissingApiKey => {
            warn!("No GEMINI_API_KEY, dry run will use the local token estimate");
            Ok(Arc::new(OfflineSummarizer {
                model: config.model.clone(),
            }))
        }
        Err(e) => Err(e.into()),
    }
}

fn privacy_for(config: &DigestConfig) -> PrivacyRegistry {
    match &config.privacy_salt {
        Some(salt) if !salt.is_empty() => {
            PrivacyRegistry::new(salt.clone(), config.opted_out_users.iter().cloned())
        }
        _ => {
            if !config.opted_out_users.is_empty() {
                warn!(
                    count = config.opted_out_users.len(),
                    "privacy_salt is not set, stored opt-outs cannot be matched"
                );
            }
            PrivacyRegistry::with_random_salt()
        }
    }
}

/// Run `summarize`: select, prepare, and either print or send.
#[instrument(skip_all, fields(transcript = %args.transcript.display(), dry_run = args.dry_run))]
pub async fn run_summarize(config: DigestConfig, args: SummarizeArgs) -> DigestResult<()> {
    let history = JsonTranscriptSource::from_path(&args.transcript)?;

    let selection = match (args.since_user, args.count) {
        (Some(user_id), _) => MessageSelection::SinceUser(user_id),
        (None, Some(count)) => MessageSelection::Latest(count),
        (None, None) => MessageSelection::Latest(config.max_messages_default),
    };

    let summarizer = summarizer_for(&config, args.dry_run)?;
    let privacy = Arc::new(privacy_for(&config));
    let controller = Arc::new(AdmissionController::new(config.limits)?);
    let settings = Arc::new(SettingsStore::new(config, controller));
    let service = SummaryService::new(summarizer, settings, privacy);

    let entries = service.collect(&history, selection).await?;
    info!(selected = entries.len(), "Selected messages");

    if args.dry_run {
        let prepared = service.prepare(entries).await?;
        println!("Messages:         {}", prepared.message_count());
        println!("Excluded:         {}", prepared.excluded_count());
        println!("Dropped (oldest): {}", prepared.dropped_count());
        println!("Estimated tokens: {}", prepared.estimated_tokens());
        println!();
        println!("{}", prepared.request().transcript());
        return Ok(());
    }

    let report = service.summarize(entries).await?;
    for message in render_reply(report.summary(), *report.message_count()) {
        println!("{}", message);
    }
    Ok(())
}
