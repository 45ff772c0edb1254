//! Metacritic Source
//!
//! Search results are matched on their full text ("Shrek Movie, 2001").
//! Ties go to the most recent release, then the review page of the winner
//! supplies both the critic metascore and the user score.

use std::sync::{Arc, LazyLock};

use limiter::ConcurrencyLimiter;
use matcher::{SimilarityMatcher, best_match, compare_years};
use regex::Regex;
use tracing::{debug, instrument};

use crate::error::{Result, SourceError};
use crate::extract::{absolute_url, attr, element_by_class, leading_number, text_content};
use crate::fetcher::PageFetcher;
use crate::types::{MetacriticResult, Score};

pub const SITE: &str = "Metacritic";
pub const BASE_URL: &str = "https://www.metacritic.com";
pub const DEFAULT_CONCURRENCY: usize = 3;

static MAIN_STATS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<div[^>]*class="[^"]*\bmain_stats\b[^"]*"[^>]*>(.*?)</div>"#)
        .expect("valid main_stats regex")
});
static PRODUCT_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="[^"]*\bproduct_title\b[^"]*"[^>]*>.*?<a\b([^>]*)>(.*?)</a>"#)
        .expect("valid product_title regex")
});
static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<p\b[^>]*>(.*?)</p>").expect("valid paragraph regex"));
static SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="[^"]*\bmetascore_w\b[^"]*"[^>]*>(?:\s*<span[^>]*>)?([^<]*)<"#)
        .expect("valid score regex")
});

/// One `.main_stats` block of the search page
#[derive(Debug, Clone, PartialEq)]
pub struct MetacriticSearchResult {
    /// All text in the block, used for matching
    pub text: String,
    pub title: String,
    pub href: Option<String>,
    pub year: Option<u16>,
}

/// Looks up titles on Metacritic
#[derive(Clone)]
pub struct MetacriticSource {
    fetcher: Arc<dyn PageFetcher>,
    limiter: ConcurrencyLimiter,
    matcher: SimilarityMatcher,
}

impl MetacriticSource {
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

    /// Find the Metacritic scores for a free-text title.
    #[instrument(skip(self), fields(site = SITE))]
    pub async fn get_ratings(&self, movie: &str) -> Result<Option<MetacriticResult>> {
        let page = self.fetch(&search_url(movie)).await?;
        let results = parse_search_results(&page);

        let Some(best) = best_match(
            &self.matcher,
            movie,
            results,
            |result| result.text.as_str(),
            |a, b| compare_years(a.year, b.year),
        ) else {
            debug!("No Metacritic match for {:?}", movie);
            return Ok(None);
        };

        let href = best
            .href
            .as_deref()
            .ok_or_else(|| SourceError::defect(SITE, format!("result {:?} has no link", best.title)))?;
        let year = best
            .year
            .ok_or_else(|| SourceError::defect(SITE, format!("result {:?} has no year", best.title)))?;
        let url = absolute_url(BASE_URL, href);

        let review_page = self.fetch(&url).await?;
        let (metascore, userscore) = parse_review_page(&review_page);

        Ok(Some(MetacriticResult {
            name: format!("{} ({})", best.title, year),
            url,
            metascore,
            userscore,
        }))
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        self.limiter.run(|| self.fetcher.fetch(url)).await
    }
}

pub fn search_url(movie: &str) -> String {
    format!("{}/search/movie/{}/results", BASE_URL, urlencoding::encode(movie))
}

/// Extract every `.main_stats` block from a search page.
pub fn parse_search_results(page: &str) -> Vec<MetacriticSearchResult> {
    MAIN_STATS
        .captures_iter(page)
        .filter_map(|caps| caps.get(1))
        .map(|block| {
            let block = block.as_str();
            let (href, title) = match PRODUCT_TITLE.captures(block) {
                Some(caps) => (
                    caps.get(1).and_then(|attrs| attr(attrs.as_str(), "href")),
                    caps.get(2).map(|t| text_content(t.as_str())).unwrap_or_default(),
                ),
                None => (None, String::new()),
            };
            let year = PARAGRAPH
                .captures(block)
                .and_then(|caps| caps.get(1))
                .and_then(|p| parse_year(&text_content(p.as_str())));

            MetacriticSearchResult {
                text: text_content(block),
                title,
                href,
                year,
            }
        })
        .collect()
}

/// "Movie, 2001" -> 2001
fn parse_year(text: &str) -> Option<u16> {
    let year = leading_number(text.replace("Movie, ", "").trim())?;
    if year.fract() == 0.0 && (0.0..=f32::from(u16::MAX)).contains(&year) {
        Some(year as u16)
    } else {
        None
    }
}

/// Read (metascore, userscore) from a review page.
///
/// Each score is looked up inside its own wrapper element only.
pub fn parse_review_page(page: &str) -> (Score, Score) {
    let header = match page.find("product_header") {
        Some(start) => &page[start..],
        None => return (Score::NotFound, Score::NotFound),
    };

    let read = |wrapper: &str| {
        match element_by_class(header, wrapper)
            .and_then(|block| SCORE.captures(block))
            .and_then(|caps| caps.get(1))
        {
            Some(text) => Score::parse(text.as_str()),
            None => Score::NotFound,
        }
    };

    (read("ms_wrapper"), read("us_wrapper"))
}
