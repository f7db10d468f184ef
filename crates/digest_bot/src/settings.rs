//! Administrative get/set of runtime settings.

use crate::DigestConfig;
use digest_error::{QuotaKind, SettingsError, SettingsErrorKind};
use digest_rate_limit::{AdmissionController, ConfigurableLimits, GeminiTier, QuotaLimit};
use parking_lot::RwLock;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};

/// Keys that hold privacy data and cannot be read or written here.
const PROTECTED_KEYS: [&str; 2] = ["opted_out_users", "privacy_salt"];

const SCALAR_KEYS: [&str; 10] = [
    "model",
    "temperature",
    "system_prompt",
    "max_messages_default",
    "max_messages_limit",
    "min_messages",
    "time_gap_threshold_minutes",
    "input_token_ceiling",
    "max_wait_secs",
    "tier",
];

fn limit_prefix(kind: QuotaKind) -> &'static str {
    match kind {
        QuotaKind::RequestsPerMinute => "limits.requests_per_minute",
        QuotaKind::TokensPerMinute => "limits.tokens_per_minute",
        QuotaKind::RequestsPerDay => "limits.requests_per_day",
    }
}

/// Which part of a quota a `limits.*` key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LimitField {
    Limit,
    Buffer,
}

fn parse_limit_key(key: &str) -> Option<(QuotaKind, LimitField)> {
    QuotaKind::ALL.into_iter().find_map(|kind| {
        let field = key.strip_prefix(limit_prefix(kind))?;
        match field {
            ".limit" => Some((kind, LimitField::Limit)),
            ".buffer" => Some((kind, LimitField::Buffer)),
            _ => None,
        }
    })
}

#[track_caller]
fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, SettingsError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| {
        SettingsError::new(SettingsErrorKind::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
        })
    })
}

#[track_caller]
fn invalid(key: &str, reason: impl Into<String>) -> SettingsError {
    SettingsError::new(SettingsErrorKind::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    })
}

/// Live settings shared by the summary service.
///
/// Every update is validated against the whole configuration before it is
/// applied. Limit changes are pushed into the [`AdmissionController`] before
/// the store itself changes, so both always agree.
#[derive(Debug)]
pub struct SettingsStore {
    config: RwLock<DigestConfig>,
    controller: Arc<AdmissionController>,
}

impl SettingsStore {
    /// Wrap a configuration and the controller enforcing its limits.
    pub fn new(config: DigestConfig, controller: Arc<AdmissionController>) -> Self {
        Self {
            config: RwLock::new(config),
            controller,
        }
    }

    /// Every key accepted by [`get`](Self::get) and [`set`](Self::set).
    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = SCALAR_KEYS.iter().map(|k| k.to_string()).collect();
        for kind in QuotaKind::ALL {
            keys.push(format!("{}.limit", limit_prefix(kind)));
            keys.push(format!("{}.buffer", limit_prefix(kind)));
        }
        keys
    }

    /// Copy of the current configuration.
    pub fn snapshot(&self) -> DigestConfig {
        self.config.read().clone()
    }

    /// Controller receiving limit updates.
    pub fn controller(&self) -> &Arc<AdmissionController> {
        &self.controller
    }

    /// Current value of a setting, as text.
    ///
    /// # Errors
    ///
    /// Returns `Protected` for privacy keys and `UnknownKey` for anything else
    /// not listed in [`keys`](Self::keys).
    pub fn get(&self, key: &str) -> Result<String, SettingsError> {
        check_not_protected(key)?;
        let config = self.config.read();

        if let Some((kind, field)) = parse_limit_key(key) {
            let limit = config.limits.get(kind);
            return Ok(match field {
                LimitField::Limit => limit.limit.to_string(),
                LimitField::Buffer => limit.buffer.to_string(),
            });
        }

        let value = match key {
            "model" => config.model.clone(),
            "temperature" => config.temperature.to_string(),
            "system_prompt" => config.system_prompt.clone(),
            "max_messages_default" => config.max_messages_default.to_string(),
            "max_messages_limit" => config.max_messages_limit.to_string(),
            "min_messages" => config.min_messages.to_string(),
            "time_gap_threshold_minutes" => config.time_gap_threshold_minutes.to_string(),
            "input_token_ceiling" => config.input_token_ceiling.to_string(),
            "max_wait_secs" => config
                .max_wait_secs
                .map(|secs| secs.to_string())
                .unwrap_or_else(|| "none".to_string()),
            "tier" => config
                .tier
                .map(|tier| tier.key().to_string())
                .unwrap_or_else(|| "none".to_string()),
            _ => return Err(SettingsError::new(SettingsErrorKind::UnknownKey(key.to_string()))),
        };
        Ok(value)
    }

    /// Parse, validate and apply a new value.
    ///
    /// `max_wait_secs` accepts `none` to remove the cap. Setting `tier` replaces
    /// every limit with the preset's; `none` keeps the current limits. Editing
    /// a single limit clears the tier.
    ///
    /// # Errors
    ///
    /// Returns `Protected` or `UnknownKey` for keys that cannot be set,
    /// `InvalidValue` when the value does not parse or breaks a constraint,
    /// and `BufferNotBelowLimit` when a limit change leaves no capacity. On
    /// error nothing changes.
    #[instrument(skip(self, value))]
    pub fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        check_not_protected(key)?;
        let mut config = self.config.write();
        let mut updated = config.clone();

        if let Some((kind, field)) = parse_limit_key(key) {
            let current = updated.limits.get(kind);
            let amount: u64 = parse(key, value)?;
            let limit = match field {
                LimitField::Limit => QuotaLimit::new(amount, current.buffer),
                LimitField::Buffer => QuotaLimit::new(current.limit, amount),
            };
            updated.limits.set(kind, limit);
            updated.tier = None;
            self.controller.update_limits(updated.limits)?;
            *config = updated;
            info!(key, value, "Setting updated");
            return Ok(());
        }

        if key == "tier" {
            if value.trim().eq_ignore_ascii_case("none") {
                updated.tier = None;
            } else {
                let tier: GeminiTier = value.parse()?;
                updated.tier = Some(tier);
                updated.limits = ConfigurableLimits::from_tier(&tier);
                self.controller.update_limits(updated.limits)?;
            }
            *config = updated;
            info!(key, value, "Setting updated");
            return Ok(());
        }

        match key {
            "model" => {
                let model = value.trim();
                if model.is_empty() {
                    return Err(invalid(key, "model cannot be empty"));
                }
                updated.model = model.to_string();
            }
            "temperature" => updated.temperature = parse(key, value)?,
            "system_prompt" => updated.system_prompt = value.to_string(),
            "max_messages_default" => updated.max_messages_default = parse(key, value)?,
            "max_messages_limit" => updated.max_messages_limit = parse(key, value)?,
            "min_messages" => updated.min_messages = parse(key, value)?,
            "time_gap_threshold_minutes" => {
                updated.time_gap_threshold_minutes = parse(key, value)?
            }
            "input_token_ceiling" => updated.input_token_ceiling = parse(key, value)?,
            "max_wait_secs" => {
                updated.max_wait_secs = if value.trim().eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(parse(key, value)?)
                }
            }
            _ => return Err(SettingsError::new(SettingsErrorKind::UnknownKey(key.to_string()))),
        }

        updated
            .validate()
            .map_err(|e| invalid(key, e.message))?;
        *config = updated;
        let logged = if key == "system_prompt" { "[prompt]" } else { value };
        info!(key, value = logged, "Setting updated");
        Ok(())
    }
}

#[track_caller]
fn check_not_protected(key: &str) -> Result<(), SettingsError> {
    if PROTECTED_KEYS.contains(&key) {
        return Err(SettingsError::new(SettingsErrorKind::Protected(key.to_string())));
    }
    Ok(())
}
