//! # Ratings Orchestrator
//!
//! Looks a title up on every review site at once:
//! 1. IMDB, Metacritic and Rotten Tomatoes run concurrently (`tokio::join!`)
//! 2. A failing site is logged and left out of the record
//! 3. The remaining scores are combined into an aggregate score
//!
//! Each site has its own limiter, shared by every title in flight, so the
//! per-site request bounds hold no matter how many titles run at once.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{error, info};

use limiter::ConcurrencyLimiter;
use matcher::SimilarityMatcher;
use sources::{ImdbSource, MetacriticSource, PageFetcher, RottenTomatoesSource};

use crate::config::AggregatorConfig;
use crate::output::{MovieRatings, aggregate_score};

/// Coordinates the three review sites
#[derive(Clone)]
pub struct RatingsOrchestrator {
    imdb: ImdbSource,
    metacritic: MetacriticSource,
    rotten_tomatoes: RottenTomatoesSource,
}

impl RatingsOrchestrator {
    /// Build the site clients, each with a limiter sized from `config`.
    ///
    /// Fails when any of the bounds is 0.
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &AggregatorConfig) -> Result<Self> {
        let matcher = SimilarityMatcher::new().with_min_lcs(config.min_lcs);

        let imdb_limiter = ConcurrencyLimiter::new(sources::imdb::SITE, config.imdb_concurrency)
            .context("Invalid IMDB concurrency")?;
        let metacritic_limiter =
            ConcurrencyLimiter::new(sources::metacritic::SITE, config.metacritic_concurrency)
                .context("Invalid Metacritic concurrency")?;
        let rotten_tomatoes_limiter = ConcurrencyLimiter::new(
            sources::rotten_tomatoes::SITE,
            config.rotten_tomatoes_concurrency,
        )
        .context("Invalid Rotten Tomatoes concurrency")?;

        Ok(Self {
            imdb: ImdbSource::new(fetcher.clone(), imdb_limiter).with_matcher(matcher),
            metacritic: MetacriticSource::new(fetcher.clone(), metacritic_limiter)
                .with_matcher(matcher),
            rotten_tomatoes: RottenTomatoesSource::new(fetcher, rotten_tomatoes_limiter)
                .with_matcher(matcher),
        })
    }

    /// Ratings for one title from every site that had it.
    ///
    /// Never fails as a whole: a site that errors is logged and its field
    /// left empty.
    pub async fn get_ratings(&self, movie: &str) -> MovieRatings {
        let start_time = Instant::now();

        let (imdb, metacritic, rotten_tomatoes) = tokio::join!(
            self.imdb.get_ratings(movie),
            self.metacritic.get_ratings(movie),
            self.rotten_tomatoes.get_ratings(movie),
        );

        let imdb = or_log(imdb, movie, sources::imdb::SITE);
        let metacritic = or_log(metacritic, movie, sources::metacritic::SITE);
        let rotten_tomatoes = or_log(rotten_tomatoes, movie, sources::rotten_tomatoes::SITE);

        let aggregate_score =
            aggregate_score(imdb.as_ref(), metacritic.as_ref(), rotten_tomatoes.as_ref());

        info!(
            "Rated {:?} in {:.2?} (imdb={}, metacritic={}, rotten_tomatoes={})",
            movie,
            start_time.elapsed(),
            imdb.is_some(),
            metacritic.is_some(),
            rotten_tomatoes.is_some()
        );

        MovieRatings {
            movie: movie.to_string(),
            aggregate_score,
            imdb,
            metacritic,
            rotten_tomatoes,
        }
    }
}

/// Turn a failed lookup into an absent result
fn or_log<T, E: Display>(
    result: std::result::Result<Option<T>, E>,
    movie: &str,
    site: &str,
) -> Option<T> {
    match result {
        Ok(found) => found,
        Err(e) => {
            error!("Failed to get {:?} from {}: {}", movie, site, e);
            None
        }
    }
}
