//! IMDB Source
//!
//! ## Algorithm
//! 1. Search feature films for the title
//! 2. Keep released results only (the name ends in a year, e.g. "Shrek (2001)")
//! 3. Narrow to the closest names with the matcher
//! 4. Fetch the rating page of every tied result
//! 5. Several films can share a name, so the tie goes to the highest rating
//!
//! IMDB blocks bursts aggressively; every request goes through the
//! limiter, which defaults to one request at a time.

use std::sync::{Arc, LazyLock};

use futures::future::join_all;
use limiter::ConcurrencyLimiter;
use matcher::{SimilarityMatcher, compare_scores, highest_by};
use regex::Regex;
use tracing::{debug, instrument};

use crate::error::{Result, SourceError};
use crate::extract::{absolute_url, attr, collapse_whitespace, text_content};
use crate::fetcher::PageFetcher;
use crate::types::{ImdbResult, Score};

pub const SITE: &str = "IMDB";
pub const BASE_URL: &str = "https://www.imdb.com";
pub const DEFAULT_CONCURRENCY: usize = 1;

static RESULT_CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<td[^>]*class="[^"]*\bresult_text\b[^"]*"[^>]*>(.*?)</td>"#)
        .expect("valid result cell regex")
});
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<a\b([^>]*)>").expect("valid link regex"));
// IMDB adds "(I)", "(II)" ... to tell apart same-name films from the same year
static ROMAN_NUMERAL_PARENTHESES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\([ivxldcm]+\)").expect("valid numeral regex"));
static TRAILING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.* \(([0-9]+)\)$").expect("valid year regex"));
static RATING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)data-testid="hero-rating-bar__aggregate-rating__score"[^>]*>\s*<span[^>]*>([^<]*)</span>"#,
    )
    .expect("valid rating regex")
});

/// One row of the IMDB search page
#[derive(Debug, Clone, PartialEq)]
pub struct ImdbSearchResult {
    /// Display name with disambiguators removed, e.g. "Shrek (2001)"
    pub name: String,
    pub href: Option<String>,
    pub year: Option<u16>,
}

impl ImdbSearchResult {
    /// Unreleased titles are listed without a year
    pub fn is_released(&self) -> bool {
        self.year.is_some()
    }

    pub fn url(&self) -> Result<String> {
        let href = self
            .href
            .as_deref()
            .ok_or_else(|| SourceError::defect(SITE, format!("search result {:?} has no link", self.name)))?;
        Ok(absolute_url(BASE_URL, href))
    }
}

/// Looks up titles on IMDB
#[derive(Clone)]
pub struct ImdbSource {
    fetcher: Arc<dyn PageFetcher>,
    limiter: ConcurrencyLimiter,
    matcher: SimilarityMatcher,
}

impl ImdbSource {
    pub fn new(fetcher: Arc<dyn PageFetcher>, limiter: ConcurrencyLimiter) -> Self {
        Self {
            fetcher,
            limiter,
            matcher: SimilarityMatcher::new(),
        }
    }

    /// Configure the matcher used on search results
    pub fn with_matcher(mut self, matcher: SimilarityMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Find the IMDB rating for a free-text title.
    ///
    /// `Ok(None)` when no released film matches, or none of the matches has a rating.
    #[instrument(skip(self), fields(site = SITE))]
    pub async fn get_ratings(&self, movie: &str) -> Result<Option<ImdbResult>> {
        let page = self.fetch(&search_url(movie)).await?;
        let released: Vec<ImdbSearchResult> = parse_search_results(&page)
            .into_iter()
            .filter(ImdbSearchResult::is_released)
            .collect();

        let best_matches = self
            .matcher
            .closest_matches(movie, released, |result| result.name.as_str());
        debug!("{} closest IMDB results for {:?}", best_matches.len(), movie);

        let mut urls = Vec::with_capacity(best_matches.len());
        for result in &best_matches {
            urls.push(result.url()?);
        }

        let scores = join_all(urls.iter().map(|url| self.fetch_score(url))).await;

        let mut rated = Vec::new();
        for ((result, url), score) in best_matches.into_iter().zip(urls).zip(scores) {
            if let Score::Value(value) = score? {
                rated.push(ImdbResult {
                    name: result.name,
                    url,
                    score: Score::Value(value),
                });
            }
        }

        // equal ratings go to the earlier search result
        rated.reverse();
        Ok(highest_by(rated, |a, b| compare_scores(a.score.value(), b.score.value())))
    }

    async fn fetch_score(&self, url: &str) -> Result<Score> {
        let page = self.fetch(url).await?;
        Ok(parse_rating_page(&page))
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        self.limiter.run(|| self.fetcher.fetch(url)).await
    }
}

pub fn search_url(movie: &str) -> String {
    format!("{}/find?q={}&s=tt&ttype=ft", BASE_URL, urlencoding::encode(movie))
}

/// Extract every result row from a search page.
pub fn parse_search_results(page: &str) -> Vec<ImdbSearchResult> {
    RESULT_CELL
        .captures_iter(page)
        .filter_map(|caps| caps.get(1))
        .map(|cell| {
            let cell = cell.as_str();
            let href = LINK
                .captures(cell)
                .and_then(|link| link.get(1))
                .and_then(|attrs| attr(attrs.as_str(), "href"));
            let name = clean_name(&text_content(cell));
            let year = parse_year(&name);

            ImdbSearchResult { name, href, year }
        })
        .collect()
}

fn clean_name(name: &str) -> String {
    let name = ROMAN_NUMERAL_PARENTHESES.replace_all(name, "");
    collapse_whitespace(&name)
}

fn parse_year(name: &str) -> Option<u16> {
    TRAILING_YEAR
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|year| year.as_str().parse().ok())
}

/// Read the aggregate rating from a title page.
pub fn parse_rating_page(page: &str) -> Score {
    match RATING.captures(page).and_then(|caps| caps.get(1)) {
        Some(score) => Score::parse(score.as_str()),
        None => Score::NotFound,
    }
}
