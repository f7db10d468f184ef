//! Configuration loading for digest.
//!
//! Sources, lowest precedence first:
//! 1. Bundled defaults (include_str! from digest.toml)
//! 2. `~/.config/digest/digest.toml`
//! 3. `./digest.toml`
//! 4. `DIGEST_*` environment variables, `__` separating nested keys

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use digest_error::{ConfigError, DigestResult};
use digest_rate_limit::{ConfigurableLimits, GeminiTier};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

/// Bundled default configuration.
pub const DEFAULT_CONFIG: &str = include_str!("../../../digest.toml");

/// Everything the summarizer can be configured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestConfig {
    /// Gemini model id
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Instructions sent with every transcript
    pub system_prompt: String,
    /// Messages fetched when the caller gives no count
    pub max_messages_default: usize,
    /// Largest count a caller may ask for
    pub max_messages_limit: usize,
    /// Smallest count a caller may ask for
    pub min_messages: usize,
    /// Silences longer than this get a time gap marker
    pub time_gap_threshold_minutes: u64,
    /// Largest estimated input a request may carry
    pub input_token_ceiling: u64,
    /// Give up instead of waiting longer than this for quota
    #[serde(default)]
    pub max_wait_secs: Option<u64>,
    /// Salt for hashing opted-out user ids
    #[serde(default)]
    pub privacy_salt: Option<String>,
    /// Salted hashes of opted-out user ids
    #[serde(default)]
    pub opted_out_users: Vec<String>,
    /// Provider preset. When set it replaces `limits` on load.
    #[serde(default)]
    pub tier: Option<GeminiTier>,
    /// Quota limits
    pub limits: ConfigurableLimits,
}

impl DigestConfig {
    /// The bundled defaults alone.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled file is broken.
    pub fn bundled() -> DigestResult<Self> {
        Self::build(Self::defaults_builder())
    }

    /// Load configuration with precedence:
    /// environment > `./digest.toml` > home directory > bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the merged
    /// configuration fails validation.
    #[instrument]
    pub fn load() -> DigestResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        let mut builder = Self::defaults_builder();

        // Add user config from home directory (optional)
        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/digest/digest.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        // Add user config from current directory (optional)
        builder = builder.add_source(File::with_name("digest").required(false));

        builder = builder.add_source(
            Environment::with_prefix("DIGEST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Self::build(builder)
    }

    /// Load bundled defaults overridden by a single file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be parsed or fails
    /// validation.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> DigestResult<Self> {
        let builder = Self::defaults_builder().add_source(File::from(path.as_ref()).required(true));
        Self::build(builder)
    }

    fn defaults_builder() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> DigestResult<Self> {
        let mut config: Self = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
        if let Some(tier) = config.tier {
            debug!(tier = tier.key(), "Seeding limits from tier");
            config.limits = ConfigurableLimits::from_tier(&tier);
        }
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limits
            .validate()
            .map_err(|e| ConfigError::new(e.kind.to_string()))?;

        if self.min_messages == 0 {
            return Err(ConfigError::new("min_messages must be at least 1"));
        }
        if self.min_messages > self.max_messages_limit {
            return Err(ConfigError::new(format!(
                "min_messages ({}) exceeds max_messages_limit ({})",
                self.min_messages, self.max_messages_limit
            )));
        }
        if self.max_messages_default > self.max_messages_limit {
            return Err(ConfigError::new(format!(
                "max_messages_default ({}) exceeds max_messages_limit ({})",
                self.max_messages_default, self.max_messages_limit
            )));
        }
        if self.time_gap_threshold_minutes == 0 {
            return Err(ConfigError::new(
                "time_gap_threshold_minutes must be positive",
            ));
        }
        if self.input_token_ceiling == 0 {
            return Err(ConfigError::new("input_token_ceiling must be positive"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::new(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        Ok(())
    }

    /// Time gap threshold as a duration.
    pub fn time_gap_threshold(&self) -> Duration {
        Duration::from_secs(self.time_gap_threshold_minutes * 60)
    }

    /// Longest acceptable wait for quota.
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }

    /// Copy safe to print: the salt is hidden and opt-outs are reduced to a count.
    pub fn redacted(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        if let Some(map) = value.as_object_mut() {
            map.insert(
                "opted_out_users".to_string(),
                serde_json::Value::String(format!(
                    "[{} opted-out users] (hashed data not shown)",
                    self.opted_out_users.len()
                )),
            );
            if self.privacy_salt.is_some() {
                map.insert(
                    "privacy_salt".to_string(),
                    serde_json::Value::String("[set]".to_string()),
                );
            }
        }
        value
    }
}
