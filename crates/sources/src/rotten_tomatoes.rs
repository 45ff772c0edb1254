//! Rotten Tomatoes Source
//!
//! Movie rows on the search page carry the release year and tomatometer as
//! attributes, so matching and tie-breaking need no further requests. Only
//! the winner's page is fetched, for the audience score.

use std::sync::{Arc, LazyLock};

use limiter::ConcurrencyLimiter;
use matcher::{SimilarityMatcher, best_match, compare_scores};
use regex::Regex;
use tracing::{debug, instrument};

use crate::error::{Result, SourceError};
use crate::extract::{absolute_url, attr, text_content};
use crate::fetcher::PageFetcher;
use crate::types::{RottenTomatoesResult, Score};

pub const SITE: &str = "Rotten Tomatoes";
pub const BASE_URL: &str = "https://www.rottentomatoes.com";
pub const DEFAULT_CONCURRENCY: usize = 4;

static RESULT_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<search-page-result\b([^>]*)>(.*?)</search-page-result>")
        .expect("valid result section regex")
});
static MEDIA_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<search-page-media-row\b([^>]*)>(.*?)</search-page-media-row>")
        .expect("valid media row regex")
});
static TITLE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a\b([^>]*\bslot\s*=\s*"title"[^>]*)>(.*?)</a>"#).expect("valid title link regex")
});
static AUDIENCE_ICON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<score-icon-audience\b([^>]*)>").expect("valid audience icon regex")
});

/// One movie row of the search page
#[derive(Debug, Clone, PartialEq)]
pub struct RottenTomatoesSearchResult {
    /// "{title} ({release year})", the year left empty when the row has none
    pub name: String,
    pub href: Option<String>,
    pub critic_score: Score,
}

/// Looks up titles on Rotten Tomatoes
#[derive(Clone)]
pub struct RottenTomatoesSource {
    fetcher: Arc<dyn PageFetcher>,
    limiter: ConcurrencyLimiter,
    matcher: SimilarityMatcher,
}

impl RottenTomatoesSource {
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

    /// Find the Rotten Tomatoes scores for a free-text title.
    ///
    /// Same-name films (Shrek (2001) and Shrek (2018)) are told apart by the
    /// higher tomatometer.
    #[instrument(skip(self), fields(site = SITE))]
    pub async fn get_ratings(&self, movie: &str) -> Result<Option<RottenTomatoesResult>> {
        let page = self.fetch(&search_url(movie)).await?;
        let results = parse_search_results(&page);

        let Some(best) = best_match(
            &self.matcher,
            movie,
            results,
            |result| result.name.as_str(),
            |a, b| compare_scores(a.critic_score.value(), b.critic_score.value()),
        ) else {
            debug!("No Rotten Tomatoes match for {:?}", movie);
            return Ok(None);
        };

        let href = best
            .href
            .as_deref()
            .ok_or_else(|| SourceError::defect(SITE, format!("result {:?} has no link", best.name)))?;
        let url = absolute_url(BASE_URL, href);

        let movie_page = self.fetch(&url).await?;
        let audience_score = parse_audience_score(&movie_page);

        Ok(Some(RottenTomatoesResult {
            name: best.name,
            url,
            critic_score: best.critic_score,
            audience_score,
        }))
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        self.limiter.run(|| self.fetcher.fetch(url)).await
    }
}

pub fn search_url(movie: &str) -> String {
    format!("{}/search?search={}", BASE_URL, urlencoding::encode(movie))
}

/// Extract the rows of the movie section of a search page.
///
/// Other sections (tv series, people) are ignored.
pub fn parse_search_results(page: &str) -> Vec<RottenTomatoesSearchResult> {
    RESULT_SECTION
        .captures_iter(page)
        .filter(|section| {
            section
                .get(1)
                .and_then(|attrs| attr(attrs.as_str(), "type"))
                .is_some_and(|kind| kind == "movie")
        })
        .filter_map(|section| section.get(2))
        .flat_map(|section| MEDIA_ROW.captures_iter(section.as_str()))
        .map(|row| {
            let row_attrs = row.get(1).map_or("", |attrs| attrs.as_str());
            let body = row.get(2).map_or("", |body| body.as_str());

            let link = TITLE_LINK.captures(body);
            let href = link
                .as_ref()
                .and_then(|link| link.get(1))
                .and_then(|attrs| attr(attrs.as_str(), "href"));
            let title = link
                .as_ref()
                .and_then(|link| link.get(2))
                .map(|text| text_content(text.as_str()))
                .unwrap_or_default();
            let year = attr(row_attrs, "releaseyear").unwrap_or_default();
            let critic_score = match attr(row_attrs, "tomatometerscore") {
                Some(score) => Score::parse(&score),
                None => Score::NotFound,
            };

            RottenTomatoesSearchResult {
                name: format!("{} ({})", title, year),
                href,
                critic_score,
            }
        })
        .collect()
}

/// Read the audience score from a movie page.
pub fn parse_audience_score(page: &str) -> Score {
    let percentage = AUDIENCE_ICON
        .captures(page)
        .and_then(|caps| caps.get(1))
        .and_then(|attrs| attr(attrs.as_str(), "percentage"));

    match percentage {
        // the site has no "tbd" state for audience scores
        Some(text) => match Score::parse(&text) {
            Score::Tbd => Score::NotFound,
            score => score,
        },
        None => Score::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticFetcher;

    const SEARCH_PAGE: &str = r#"
        <search-page-result type="tvSeries" slot="tvSeries">
          <search-page-media-row releaseyear="2001" tomatometerscore="99">
            <a href="/tv/shrek" slot="title">Shrek</a>
          </search-page-media-row>
        </search-page-result>
        <search-page-result type="movie" slot="movie">
          <ul slot="list">
            <search-page-media-row cast="Mike Myers" releaseyear="2001" tomatometerscore="88" tomatometerstate="certified-fresh">
              <a href="https://www.rottentomatoes.com/m/shrek" class="unset" data-qa="thumbnail-link" slot="thumbnail"><img></a>
              <a href="https://www.rottentomatoes.com/m/shrek" class="unset" data-qa="info-name" slot="title">
                Shrek
              </a>
            </search-page-media-row>
            <search-page-media-row releaseyear="2018" tomatometerscore="">
              <a href="https://www.rottentomatoes.com/m/shrek_2018" slot="title">Shrek</a>
            </search-page-media-row>
            <search-page-media-row releaseyear="2004" tomatometerscore="89">
              <a href="https://www.rottentomatoes.com/m/shrek_2" slot="title">Shrek 2</a>
            </search-page-media-row>
          </ul>
        </search-page-result>
    "#;

    const MOVIE_PAGE: &str = r#"
        <score-board-deprecated audiencestate="upright">
          <score-icon-audience slot="audienceScore" percentage="69" state="upright"></score-icon-audience>
        </score-board-deprecated>
    "#;

    fn source(fetcher: Arc<StaticFetcher>) -> RottenTomatoesSource {
        let limiter = ConcurrencyLimiter::new(SITE, DEFAULT_CONCURRENCY).unwrap();
        RottenTomatoesSource::new(fetcher, limiter)
    }

    #[test]
    fn test_parse_search_results_movies_only() {
        let results = parse_search_results(SEARCH_PAGE);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].name, "Shrek (2001)");
        assert_eq!(results[0].href.as_deref(), Some("https://www.rottentomatoes.com/m/shrek"));
        assert_eq!(results[0].critic_score, Score::Value(88.0));
        assert_eq!(results[1].name, "Shrek (2018)");
        assert_eq!(results[1].critic_score, Score::NotFound);
    }

    #[test]
    fn test_parse_audience_score() {
        assert_eq!(parse_audience_score(MOVIE_PAGE), Score::Value(69.0));
        assert_eq!(
            parse_audience_score(r#"<score-icon-audience percentage=""></score-icon-audience>"#),
            Score::NotFound
        );
        assert_eq!(parse_audience_score("<html></html>"), Score::NotFound);
    }

    #[tokio::test]
    async fn test_get_ratings_prefers_scored_result() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .with_page(search_url("Shrek"), SEARCH_PAGE)
                .with_page("https://www.rottentomatoes.com/m/shrek", MOVIE_PAGE),
        );

        let result = source(fetcher.clone()).get_ratings("Shrek").await.unwrap().unwrap();

        assert_eq!(result.name, "Shrek (2001)");
        assert_eq!(result.url, "https://www.rottentomatoes.com/m/shrek");
        assert_eq!(result.critic_score, Score::Value(88.0));
        assert_eq!(result.audience_score, Score::Value(69.0));
        // only the winner's page is fetched
        assert_eq!(
            fetcher.requests(),
            vec![search_url("Shrek"), "https://www.rottentomatoes.com/m/shrek".to_string()]
        );
    }

    #[tokio::test]
    async fn test_no_movie_section() {
        let page = r#"<search-page-result type="celebrity"></search-page-result>"#;
        let fetcher = Arc::new(StaticFetcher::new().with_page(search_url("Shrek"), page));

        assert!(source(fetcher).get_ratings("Shrek").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_link_is_a_defect() {
        let page = r#"<search-page-result type="movie">
            <search-page-media-row releaseyear="2001" tomatometerscore="88">
              <a class="unset" slot="title">Shrek</a>
            </search-page-media-row>
        </search-page-result>"#;
        let fetcher = Arc::new(StaticFetcher::new().with_page(search_url("Shrek"), page));

        let result = source(fetcher).get_ratings("Shrek").await;
        assert!(matches!(result, Err(SourceError::Defect { site: SITE, .. })));
    }
}
