//! Configuration error types.

/// Configuration could not be loaded or failed validation.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// What went wrong
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError at the caller's location.
    ///
    /// # Examples
    ///
    /// ```
    /// use digest_error::ConfigError;
    ///
    /// let err = ConfigError::new("time_gap_threshold_minutes must be positive");
    /// assert!(err.message.contains("time_gap"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
