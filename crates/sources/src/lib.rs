//! # Sources Crate
//!
//! Scrapes ratings for a free-text movie title from three review sites.
//!
//! ## Components
//!
//! ### IMDB
//! Feature-film search, then the rating page of every closely matching
//! released title. Same-name films are told apart by the higher rating.
//!
//! ### Metacritic
//! Movie search, then the review page of the closest (most recent) match
//! for both the critic metascore and the user score.
//!
//! ### Rotten Tomatoes
//! Search page rows carry the tomatometer directly; the audience score
//! comes from the matched title's page.
//!
//! Every source sends its requests through its own
//! [`limiter::ConcurrencyLimiter`] and fetches pages through a shared
//! [`PageFetcher`].
//!
//! ## Example Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use limiter::ConcurrencyLimiter;
//! use sources::{HttpFetcher, ImdbSource};
//!
//! let fetcher = Arc::new(HttpFetcher::new()?);
//! let imdb = ImdbSource::new(fetcher, ConcurrencyLimiter::new("IMDB", 1)?);
//!
//! if let Some(result) = imdb.get_ratings("Shrek").await? {
//!     println!("{} {}", result.name, result.score);
//! }
//! ```

pub mod error;
pub mod extract;
pub mod fetcher;
pub mod imdb;
pub mod metacritic;
pub mod rotten_tomatoes;
pub mod types;

pub use error::{Result, SourceError};
pub use fetcher::{HttpFetcher, PageFetcher};
pub use imdb::ImdbSource;
pub use metacritic::MetacriticSource;
pub use rotten_tomatoes::RottenTomatoesSource;
pub use types::{ImdbResult, MetacriticResult, RottenTomatoesResult, Score};
