use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use aggregator::config::DEFAULT_TITLE_CONCURRENCY;
use aggregator::{AggregatorConfig, OutputFormat, RatingsOrchestrator, RecordWriter};
use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use limiter::ConcurrencyLimiter;
use sources::HttpFetcher;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// movie-ratings - Movie scores from IMDB, Metacritic and Rotten Tomatoes
#[derive(Parser, Debug)]
#[command(name = "movie-ratings")]
#[command(
    about = "Look up movie ratings on IMDB, Metacritic and Rotten Tomatoes",
    long_about = "Reads movie titles, one per line, from FILE (or stdin when no file is given) \
                  and prints their ratings as CSV, or as JSON with --json. \
                  Results are printed as they complete, so they may not follow input order."
)]
struct Cli {
    /// File with one movie title per line
    file: Option<PathBuf>,

    /// Output in JSON format (instead of CSV)
    #[arg(long)]
    json: bool,

    /// Maximum number of movies queried simultaneously. If set too high,
    /// queries will be rejected by the websites queried.
    #[arg(long, default_value_t = DEFAULT_TITLE_CONCURRENCY, value_parser = parse_bound)]
    rate_limit: usize,

    /// Maximum simultaneous requests to IMDB
    #[arg(long, default_value_t = sources::imdb::DEFAULT_CONCURRENCY, value_parser = parse_bound)]
    imdb_concurrency: usize,

    /// Maximum simultaneous requests to Metacritic
    #[arg(long, default_value_t = sources::metacritic::DEFAULT_CONCURRENCY, value_parser = parse_bound)]
    metacritic_concurrency: usize,

    /// Maximum simultaneous requests to Rotten Tomatoes
    #[arg(long, default_value_t = sources::rotten_tomatoes::DEFAULT_CONCURRENCY, value_parser = parse_bound)]
    rotten_tomatoes_concurrency: usize,
}

impl Cli {
    fn config(&self) -> AggregatorConfig {
        AggregatorConfig::default()
            .with_title_concurrency(self.rate_limit)
            .with_imdb_concurrency(self.imdb_concurrency)
            .with_metacritic_concurrency(self.metacritic_concurrency)
            .with_rotten_tomatoes_concurrency(self.rotten_tomatoes_concurrency)
    }

    fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Csv
        }
    }
}

fn parse_bound(value: &str) -> std::result::Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(bound) => Ok(bound),
        Err(e) => Err(e.to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only the CSV / JSON output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    debug!("Starting with {:?}", config);

    let input: Box<dyn AsyncRead + Unpin + Send> = match &cli.file {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };

    let fetcher = Arc::new(HttpFetcher::new().context("Failed to build HTTP client")?);
    let orchestrator = RatingsOrchestrator::new(fetcher, &config)?;

    let start = Instant::now();
    let mut writer = RecordWriter::start(io::stdout(), cli.format())?;
    rate_titles(input, orchestrator, config.title_concurrency, &mut writer).await?;
    let rated = writer.written();
    writer.finish()?;

    eprintln!(
        "{} Rated {} movies in {:.2?}",
        "✓".green(),
        rated,
        start.elapsed()
    );

    Ok(())
}

/// Look up every title read from `input`, writing records as they complete.
///
/// At most `title_concurrency` titles are in flight; the rest wait in input
/// order.
async fn rate_titles<R, W>(
    input: R,
    orchestrator: RatingsOrchestrator,
    title_concurrency: usize,
    writer: &mut RecordWriter<W>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let titles = ConcurrencyLimiter::new("titles", title_concurrency).context("Invalid rate limit")?;
    let lookup = titles.wrap(move |movie: String| {
        let orchestrator = orchestrator.clone();
        async move { orchestrator.get_ratings(&movie).await }
    });

    // split on raw bytes so a badly encoded line only garbles that title
    let mut lines = BufReader::new(input).split(b'\n');
    let mut tasks = JoinSet::new();
    let mut input_open = true;

    loop {
        tokio::select! {
            line = lines.next_segment(), if input_open => {
                match line.context("Failed to read input")? {
                    Some(line) => {
                        let line = String::from_utf8_lossy(&line);
                        let movie = line.trim();
                        if !movie.is_empty() {
                            info!("Queued {:?}", movie);
                            tasks.spawn(lookup.call(movie.to_string()));
                        }
                    }
                    None => input_open = false,
                }
            }
            Some(joined) = tasks.join_next() => {
                let ratings = joined.context("Lookup task panicked")?;
                writer.write(&ratings)?;
                debug!(
                    "{} titles in flight, {} waiting",
                    lookup.limiter().in_flight(),
                    lookup.limiter().queued()
                );
            }
            else => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sources::{PageFetcher, SourceError};

    struct NoPages;

    #[async_trait::async_trait]
    impl PageFetcher for NoPages {
        async fn fetch(&self, url: &str) -> sources::Result<String> {
            Err(SourceError::defect("test", format!("no page for {}", url)))
        }
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["movie-ratings"]).unwrap();

        assert!(cli.file.is_none());
        assert_eq!(cli.format(), OutputFormat::Csv);
        assert_eq!(cli.config(), AggregatorConfig::default());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "movie-ratings",
            "movies.txt",
            "--json",
            "--rate-limit",
            "5",
            "--imdb-concurrency",
            "2",
        ])
        .unwrap();

        assert_eq!(cli.file, Some(PathBuf::from("movies.txt")));
        assert_eq!(cli.format(), OutputFormat::Json);
        assert_eq!(cli.config().title_concurrency, 5);
        assert_eq!(cli.config().imdb_concurrency, 2);
    }

    #[test]
    fn test_zero_rate_limit_is_rejected() {
        assert!(Cli::try_parse_from(["movie-ratings", "--rate-limit", "0"]).is_err());
        assert!(Cli::try_parse_from(["movie-ratings", "--rate-limit", "many"]).is_err());
    }

    #[tokio::test]
    async fn test_rate_titles_skips_blank_lines() {
        let orchestrator = RatingsOrchestrator::new(Arc::new(NoPages), &AggregatorConfig::default()).unwrap();
        let input: &[u8] = b"Shrek\n\n   \n  Dune  \nAmelie";
        let mut writer = RecordWriter::start(Vec::new(), OutputFormat::Json).unwrap();

        rate_titles(input, orchestrator, 2, &mut writer).await.unwrap();
        assert_eq!(writer.written(), 3);

        let out = writer.finish().unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_slice(&out).unwrap();
        let mut movies: Vec<&str> = records.iter().filter_map(|r| r["movie"].as_str()).collect();
        movies.sort();
        assert_eq!(movies, vec!["Amelie", "Dune", "Shrek"]);
    }

    #[tokio::test]
    async fn test_rate_titles_survives_badly_encoded_line() {
        let orchestrator = RatingsOrchestrator::new(Arc::new(NoPages), &AggregatorConfig::default()).unwrap();
        // Latin-1 "Amélie"
        let input: &[u8] = b"Shrek\r\nAm\xe9lie\nDune\n";
        let mut writer = RecordWriter::start(Vec::new(), OutputFormat::Json).unwrap();

        rate_titles(input, orchestrator, 2, &mut writer).await.unwrap();
        assert_eq!(writer.written(), 3);

        let out = writer.finish().unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_slice(&out).unwrap();
        let mut movies: Vec<&str> = records.iter().filter_map(|r| r["movie"].as_str()).collect();
        movies.sort();
        assert_eq!(movies, vec!["Am\u{fffd}lie", "Dune", "Shrek"]);
    }
}
