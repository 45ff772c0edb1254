//! Runtime configuration, built once from the command line.

/// Titles looked up at once when nothing else is configured
pub const DEFAULT_TITLE_CONCURRENCY: usize = 3;

/// Concurrency bounds and matching settings for a [`crate::RatingsOrchestrator`].
///
/// ```
/// use aggregator::AggregatorConfig;
///
/// let config = AggregatorConfig::default()
///     .with_title_concurrency(5)
///     .with_imdb_concurrency(2);
/// assert_eq!(config.imdb_concurrency, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Titles processed at once
    pub title_concurrency: usize,
    /// Requests in flight to each site
    pub imdb_concurrency: usize,
    pub metacritic_concurrency: usize,
    pub rotten_tomatoes_concurrency: usize,
    /// Shortest common subsequence a search result needs to count as a match
    pub min_lcs: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            title_concurrency: DEFAULT_TITLE_CONCURRENCY,
            imdb_concurrency: sources::imdb::DEFAULT_CONCURRENCY,
            metacritic_concurrency: sources::metacritic::DEFAULT_CONCURRENCY,
            rotten_tomatoes_concurrency: sources::rotten_tomatoes::DEFAULT_CONCURRENCY,
            min_lcs: matcher::DEFAULT_MIN_LCS,
        }
    }
}

impl AggregatorConfig {
    pub fn with_title_concurrency(mut self, bound: usize) -> Self {
        self.title_concurrency = bound;
        self
    }

    pub fn with_imdb_concurrency(mut self, bound: usize) -> Self {
        self.imdb_concurrency = bound;
        self
    }

    pub fn with_metacritic_concurrency(mut self, bound: usize) -> Self {
        self.metacritic_concurrency = bound;
        self
    }

    pub fn with_rotten_tomatoes_concurrency(mut self, bound: usize) -> Self {
        self.rotten_tomatoes_concurrency = bound;
        self
    }

    pub fn with_min_lcs(mut self, min_lcs: usize) -> Self {
        self.min_lcs = min_lcs;
        self
    }
}
