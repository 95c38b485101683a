//! Error types for the wrapper.

use thiserror::Error;

/// Main error type for wrapper operations.
///
/// Dead-process writes and pump end-of-stream are deliberately not errors:
/// the former is a logged warning and a dropped command, the latter is a
/// clean pump exit.
#[derive(Error, Debug)]
pub enum WrapperError {
    /// The engine binary is missing, unreadable, or failed to launch.
    /// Fatal to the session attempt.
    #[error("failed to launch engine `{binary}`: {source}")]
    Startup {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// A requested rating has no configured weights entry. Recovered locally
    /// by rejecting the reconfiguration request.
    #[error("no weights configured for rating {0}")]
    UnknownRating(u32),

    /// Invalid wrapper configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A session state transition that the lifecycle does not allow.
    #[error("invalid session transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    /// IO errors without a more specific recovery.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for wrapper operations.
pub type Result<T> = std::result::Result<T, WrapperError>;
