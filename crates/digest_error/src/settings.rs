//! Errors from administrative setting changes.

/// Reasons a settings update is refused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum SettingsErrorKind {
    /// No setting with this key exists
    #[display("There is no setting {}", _0)]
    UnknownKey(String),
    /// The setting may not be changed through the settings interface
    #[display("Setting {} cannot be modified here", _0)]
    Protected(String),
    /// The value could not be parsed for this key
    #[display("Invalid value for {}: {}", key, reason)]
    InvalidValue {
        /// Setting key
        key: String,
        /// What was wrong with the value
        reason: String,
    },
    /// A window buffer would swallow its whole limit
    #[display("Buffer {} must be smaller than limit {} for {}", buffer, limit, window)]
    BufferNotBelowLimit {
        /// Window name
        window: String,
        /// Configured limit
        limit: u64,
        /// Configured buffer
        buffer: u64,
    },
    /// Requested message count is outside the allowed range
    #[display("Message count must be between {} and {}, got {}", min, max, requested)]
    MessageCountOutOfRange {
        /// Requested count
        requested: usize,
        /// Lowest accepted count
        min: usize,
        /// Highest accepted count
        max: usize,
    },
}

/// Settings error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Settings Error: {} at line {} in {}", kind, line, file)]
pub struct SettingsError {
    /// The kind of error that occurred
    pub kind: SettingsErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl SettingsError {
    /// Create a new settings error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SettingsErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
