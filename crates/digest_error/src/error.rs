//! Top-level error wrapper types.

use crate::{AdmissionError, ConfigError, GeminiError, SettingsError, TranscriptError};

/// Every error the digest crates can produce.
///
/// # Examples
///
/// ```
/// use digest_error::{ConfigError, DigestError};
///
/// let err: DigestError = ConfigError::new("bad limits").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum DigestErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Rate limiting admission error
    #[from(AdmissionError)]
    Admission(AdmissionError),
    /// Gemini API error
    #[from(GeminiError)]
    Gemini(GeminiError),
    /// Administrative settings error
    #[from(SettingsError)]
    Settings(SettingsError),
    /// Channel history error
    #[from(TranscriptError)]
    Transcript(TranscriptError),
}

/// Digest error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Digest Error: {}", _0)]
pub struct DigestError(Box<DigestErrorKind>);

impl DigestError {
    /// Create a new error from a kind.
    pub fn new(kind: DigestErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &DigestErrorKind {
        &self.0
    }

    /// The admission error inside, if this is one.
    pub fn as_admission(&self) -> Option<&AdmissionError> {
        match self.kind() {
            DigestErrorKind::Admission(e) => Some(e),
            _ => None,
        }
    }
}

impl<T> From<T> for DigestError
where
    T: Into<DigestErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for digest operations.
pub type DigestResult<T> = std::result::Result<T, DigestError>;
