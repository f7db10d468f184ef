//! Concrete tier presets.

use crate::Tier;
use digest_error::{SettingsError, SettingsErrorKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Gemini API usage tiers.
///
/// Based on [Gemini API rate limits](https://ai.google.dev/gemini-api/docs/rate-limits).
///
/// Selected in configuration by [`key`](GeminiTier::key):
///
/// ```
/// use digest_rate_limit::{ConfigurableLimits, GeminiTier, QuotaKind};
///
/// let tier: GeminiTier = "flash-free".parse().unwrap();
/// let limits = ConfigurableLimits::from_tier(&tier);
/// assert_eq!(limits.get(QuotaKind::RequestsPerDay).limit, 250);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeminiTier {
    /// Free tier, Flash-Lite models: 15 RPM, 250K TPM, 1000 RPD
    FlashLiteFree,
    /// Free tier, Flash models: 10 RPM, 250K TPM, 250 RPD
    FlashFree,
    /// Pay-as-you-go: 4000 RPM, 4M TPM, no daily limit
    PayAsYouGo,
}

impl GeminiTier {
    /// Every preset.
    pub const ALL: [GeminiTier; 3] = [
        GeminiTier::FlashLiteFree,
        GeminiTier::FlashFree,
        GeminiTier::PayAsYouGo,
    ];

    /// Configuration key for this tier.
    pub fn key(&self) -> &'static str {
        match self {
            GeminiTier::FlashLiteFree => "flash-lite-free",
            GeminiTier::FlashFree => "flash-free",
            GeminiTier::PayAsYouGo => "pay-as-you-go",
        }
    }
}

impl FromStr for GeminiTier {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|tier| tier.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|tier| tier.key()).collect();
                SettingsError::new(SettingsErrorKind::InvalidValue {
                    key: "tier".to_string(),
                    reason: format!(
                        "unknown tier '{}', expected one of {}",
                        wanted,
                        known.join(", ")
                    ),
                })
            })
    }
}

impl Tier for GeminiTier {
    fn rpm(&self) -> Option<u32> {
        match self {
            GeminiTier::FlashLiteFree => Some(15),
            GeminiTier::FlashFree => Some(10),
            GeminiTier::PayAsYouGo => Some(4000),
        }
    }

    fn tpm(&self) -> Option<u64> {
        match self {
            GeminiTier::FlashLiteFree | GeminiTier::FlashFree => Some(250_000),
            GeminiTier::PayAsYouGo => Some(4_000_000),
        }
    }

    fn rpd(&self) -> Option<u32> {
        match self {
            GeminiTier::FlashLiteFree => Some(1000),
            GeminiTier::FlashFree => Some(250),
            GeminiTier::PayAsYouGo => None,
        }
    }

    fn name(&self) -> &str {
        match self {
            GeminiTier::FlashLiteFree => "Free (Flash-Lite)",
            GeminiTier::FlashFree => "Free (Flash)",
            GeminiTier::PayAsYouGo => "Pay-as-you-go",
        }
    }
}
