//! Error types for the limiter crate.

use thiserror::Error;

/// Errors raised while building a limiter.
///
/// Running work through a limiter never produces one of these: the wrapped
/// operation's own output, success or failure, is passed back unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LimiterError {
    /// A limiter must admit at least one call at a time
    #[error("Concurrency bound for {name} must be at least 1")]
    ZeroBound { name: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, LimiterError>;
