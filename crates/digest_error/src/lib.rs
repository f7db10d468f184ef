//! Error types for the digest workspace.
//!
//! Every concern follows the same shape:
//! - a `*ErrorKind` enum naming the specific condition
//! - a `*Error` struct wrapping the kind together with the source location
//!   captured by `#[track_caller]`
//!
//! Everything converts into [`DigestError`] so callers can use `?` freely.
//!
//! # Examples
//!
//! ```
//! use digest_error::{ConfigError, DigestResult};
//!
//! fn load() -> DigestResult<String> {
//!     Err(ConfigError::new("missing model name"))?
//! }
//!
//! assert!(load().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod admission;
mod config;
mod error;
mod gemini;
mod settings;
mod transcript;

pub use admission::{AdmissionError, AdmissionErrorKind, QuotaKind};
pub use config::ConfigError;
pub use error::{DigestError, DigestErrorKind, DigestResult};
pub use gemini::{GeminiError, GeminiErrorKind, RetryableError};
pub use settings::{SettingsError, SettingsErrorKind};
pub use transcript::{TranscriptError, TranscriptErrorKind};
