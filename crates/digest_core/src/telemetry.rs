//! Tracing subscriber setup.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line output
    #[default]
    Human,
    /// One JSON object per event
    Json,
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `default_directive` (e.g. `"info"`)
/// is used.
///
/// # Errors
///
/// Returns an error if the directive is invalid or a subscriber is already set.
pub fn init_telemetry(
    format: LogFormat,
    default_directive: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive)?,
    };

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Human => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?,
    }

    Ok(())
}
