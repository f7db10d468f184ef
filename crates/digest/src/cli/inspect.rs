//! Read-only commands: limits, config, privacy-hash.

use digest_bot::{DigestConfig, PrivacyRegistry};
use digest_error::{ConfigError, DigestResult};
use digest_rate_limit::{AdmissionController, Tier};
use tokio::time::Instant;

/// Print the tier, if any, then each window's limit, buffer and usage.
pub fn show_limits(config: &DigestConfig) -> DigestResult<()> {
    let controller = AdmissionController::new(config.limits)?;

    if let Some(tier) = config.tier {
        println!("Tier: {} ({})\n", tier.name(), tier.key());
    }
    println!(
        "{:<22} {:>12} {:>10} {:>12} {:>12}",
        "WINDOW", "LIMIT", "BUFFER", "USED", "REMAINING"
    );
    for usage in controller.snapshot(Instant::now()) {
        println!(
            "{:<22} {:>12} {:>10} {:>12} {:>12}",
            usage.kind().to_string(),
            usage.limit().limit,
            usage.limit().buffer,
            usage.used(),
            usage.remaining()
        );
    }
    Ok(())
}

/// Print the effective configuration as JSON, privacy data redacted.
pub fn show_config(config: &DigestConfig) -> DigestResult<()> {
    let text = serde_json::to_string_pretty(&config.redacted())
        .map_err(|e| ConfigError::new(format!("Failed to render configuration: {}", e)))?;
    println!("{}", text);
    Ok(())
}

/// Print the opt-out hash for `user_id` under the configured salt.
pub fn privacy_hash(config: &DigestConfig, user_id: u64) -> DigestResult<()> {
    let salt = config
        .privacy_salt
        .as_deref()
        .filter(|salt| !salt.is_empty())
        .ok_or_else(|| ConfigError::new("privacy_salt is not set"))?;
    let registry = PrivacyRegistry::new(salt, Vec::new());
    println!("{}", registry.hash_user_id(user_id));
    Ok(())
}
