//! Transcript source errors.

/// Failures while obtaining channel history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum TranscriptErrorKind {
    /// Could not read the transcript source
    #[display("Failed to read transcript: {}", _0)]
    Read(String),
    /// The transcript could not be decoded
    #[display("Malformed transcript: {}", _0)]
    Malformed(String),
    /// Nothing left to summarize
    #[display("No messages available to summarize")]
    Empty,
}

/// Transcript error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Transcript Error: {} at line {} in {}", kind, line, file)]
pub struct TranscriptError {
    /// The kind of error that occurred
    pub kind: TranscriptErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl TranscriptError {
    /// Create a new transcript error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TranscriptErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
