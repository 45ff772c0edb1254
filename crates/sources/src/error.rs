//! Error types for the sources crate.
//!
//! A title that simply isn't listed on a site is not an error: lookups
//! return `Ok(None)` for that. These variants cover the cases where the
//! lookup itself could not be completed.

use thiserror::Error;

/// Errors that can occur while querying a review site
#[derive(Error, Debug)]
pub enum SourceError {
    /// Network failure, timeout or non-success HTTP status
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The page no longer has the structure we extract from
    ///
    /// This signals drift in the scraped markup (e.g. a result link without
    /// an `href`), not a condition to retry. It aborts only the current
    /// title's lookup on this site.
    #[error("Unexpected page structure on {site}: {reason}")]
    Defect { site: &'static str, reason: String },
}

impl SourceError {
    pub fn defect(site: &'static str, reason: impl Into<String>) -> Self {
        SourceError::Defect {
            site,
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, SourceError>;
