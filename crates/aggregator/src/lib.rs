//! Aggregator crate for the movie ratings tool.
//!
//! Queries every review site for a title, combines whatever came back into a
//! [`MovieRatings`] record and renders records as CSV or JSON.

pub mod config;
pub mod orchestrator;
pub mod output;

pub use config::AggregatorConfig;
pub use orchestrator::RatingsOrchestrator;
pub use output::{MovieRatings, OutputFormat, RecordWriter, aggregate_score, csv_friendly};
