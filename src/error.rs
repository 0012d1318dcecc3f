//! Error type shared by every fallible engine operation.

/// Faults surfaced to the caller.
///
/// Timeouts are never errors: they degrade guess quality and are recorded in
/// the event log instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Out-of-range counts, malformed guesses or answers, or a bad config.
    /// The engine state is left untouched.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The position-only solver path (every weapon known, too many orderings
    /// to enumerate) has no implementation.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}

impl EngineError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        EngineError::InvalidInput(msg.into())
    }
}
