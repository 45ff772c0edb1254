//! Output records and their CSV / JSON rendering.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use sources::{ImdbResult, MetacriticResult, RottenTomatoesResult, Score};

/// Column order of the CSV output
pub const CSV_HEADERS: [&str; 10] = [
    "Movie",
    "Aggregate Score",
    "Metacritic Name",
    "Metacritic Critic Score",
    "Metacritic User Score",
    "IMDB Name",
    "IMDB Score",
    "Rotten Tomatoes Name",
    "Rotten Tomatoes Critic Score",
    "Rotten Tomatoes User Score",
];

/// Everything found for one input title
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRatings {
    /// The title as typed
    pub movie: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate_score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb: Option<ImdbResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metacritic: Option<MetacriticResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotten_tomatoes: Option<RottenTomatoesResult>,
}

impl MovieRatings {
    /// One CSV row, in [`CSV_HEADERS`] order, without a line ending.
    pub fn to_csv_row(&self) -> String {
        let cell = |score: Option<&Score>| score.map(Score::to_string).unwrap_or_default();

        let cells = [
            self.movie.clone(),
            self.aggregate_score.map(|s| s.to_string()).unwrap_or_default(),
            self.metacritic.as_ref().map(|m| m.name.clone()).unwrap_or_default(),
            cell(self.metacritic.as_ref().map(|m| &m.metascore)),
            cell(self.metacritic.as_ref().map(|m| &m.userscore)),
            self.imdb.as_ref().map(|i| i.name.clone()).unwrap_or_default(),
            cell(self.imdb.as_ref().map(|i| &i.score)),
            self.rotten_tomatoes.as_ref().map(|r| r.name.clone()).unwrap_or_default(),
            cell(self.rotten_tomatoes.as_ref().map(|r| &r.critic_score)),
            cell(self.rotten_tomatoes.as_ref().map(|r| &r.audience_score)),
        ];

        cells.iter().map(|c| csv_friendly(c)).collect::<Vec<_>>().join(",")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize ratings")
    }
}

/// Average of every numeric score on a 0-100 scale, to one decimal place.
///
/// IMDB and Metacritic user scores are out of 10 and get scaled up; tbd and
/// missing scores are skipped. `None` when there is nothing to average.
pub fn aggregate_score(
    imdb: Option<&ImdbResult>,
    metacritic: Option<&MetacriticResult>,
    rotten_tomatoes: Option<&RottenTomatoesResult>,
) -> Option<f32> {
    let mut scores = Vec::with_capacity(5);

    if let Some(imdb) = imdb {
        scores.extend(imdb.score.value().map(|s| s * 10.0));
    }
    if let Some(metacritic) = metacritic {
        scores.extend(metacritic.metascore.value());
        scores.extend(metacritic.userscore.value().map(|s| s * 10.0));
    }
    if let Some(rotten_tomatoes) = rotten_tomatoes {
        scores.extend(rotten_tomatoes.critic_score.value());
        scores.extend(rotten_tomatoes.audience_score.value());
    }

    matcher::average(&scores).map(|avg| (avg * 10.0).round() / 10.0)
}

/// Quote a CSV cell if it contains a comma, newline or double quote.
pub fn csv_friendly(cell: &str) -> String {
    if !cell.contains([',', '\n', '"']) {
        return cell.to_string();
    }

    format!("\"{}\"", cell.replace('"', "\"\""))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

/// Streams records to `W` in the order they are handed over.
///
/// CSV gets a header row up front; JSON is a single array whose closing
/// bracket is written by [`RecordWriter::finish`].
pub struct RecordWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    /// Write the preamble (CSV header or opening bracket).
    pub fn start(mut writer: W, format: OutputFormat) -> Result<Self> {
        match format {
            OutputFormat::Csv => writeln!(writer, "{}", CSV_HEADERS.join(","))?,
            OutputFormat::Json => write!(writer, "[")?,
        }
        writer.flush()?;

        Ok(Self {
            writer,
            format,
            written: 0,
        })
    }

    pub fn write(&mut self, ratings: &MovieRatings) -> Result<()> {
        match self.format {
            OutputFormat::Csv => writeln!(self.writer, "{}", ratings.to_csv_row())?,
            OutputFormat::Json => {
                if self.written > 0 {
                    write!(self.writer, ",")?;
                }
                write!(self.writer, "{}", ratings.to_json()?)?;
            }
        }
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> Result<W> {
        if self.format == OutputFormat::Json {
            writeln!(self.writer, "]")?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shrek() -> MovieRatings {
        let imdb = ImdbResult {
            name: "Shrek (2001)".to_string(),
            url: "https://www.imdb.com/title/tt0126029/".to_string(),
            score: Score::Value(7.9),
        };
        let metacritic = MetacriticResult {
            name: "Shrek (2001)".to_string(),
            url: "https://www.metacritic.com/movie/shrek".to_string(),
            metascore: Score::Value(84.0),
            userscore: Score::Tbd,
        };

        MovieRatings {
            movie: "Shrek".to_string(),
            aggregate_score: aggregate_score(Some(&imdb), Some(&metacritic), None),
            imdb: Some(imdb),
            metacritic: Some(metacritic),
            rotten_tomatoes: None,
        }
    }

    #[test]
    fn test_aggregate_score_scales_and_rounds() {
        // (79 + 84) / 2
        assert_eq!(shrek().aggregate_score, Some(81.5));

        let rotten_tomatoes = RottenTomatoesResult {
            name: "Shrek (2001)".to_string(),
            url: "https://www.rottentomatoes.com/m/shrek".to_string(),
            critic_score: Score::Value(88.0),
            audience_score: Score::Value(69.0),
        };
        let metacritic = MetacriticResult {
            userscore: Score::Value(7.6),
            ..shrek().metacritic.unwrap()
        };
        // (79 + 84 + 76 + 88 + 69) / 5 = 79.2
        let score = aggregate_score(shrek().imdb.as_ref(), Some(&metacritic), Some(&rotten_tomatoes));
        assert_eq!(score, Some(79.2));
    }

    #[test]
    fn test_aggregate_score_nothing_numeric() {
        assert_eq!(aggregate_score(None, None, None), None);

        let imdb = ImdbResult {
            name: "Shrek 5".to_string(),
            url: String::new(),
            score: Score::NotFound,
        };
        assert_eq!(aggregate_score(Some(&imdb), None, None), None);
    }

    #[test]
    fn test_csv_friendly() {
        assert_eq!(csv_friendly("Shrek"), "Shrek");
        assert_eq!(csv_friendly("Crouching Tiger, Hidden Dragon"), "\"Crouching Tiger, Hidden Dragon\"");
        assert_eq!(csv_friendly("The \"Best\" One"), "\"The \"\"Best\"\" One\"");
        assert_eq!(csv_friendly(""), "");
    }

    #[test]
    fn test_csv_row() {
        assert_eq!(
            shrek().to_csv_row(),
            "Shrek,81.5,Shrek (2001),84,tbd,Shrek (2001),7.9,,,"
        );
    }

    #[test]
    fn test_json_omits_missing_sources() {
        let json: serde_json::Value = serde_json::from_str(&shrek().to_json().unwrap()).unwrap();

        assert_eq!(json["movie"], "Shrek");
        assert_eq!(json["aggregateScore"], 81.5);
        assert_eq!(json["metacritic"]["userscore"], "tbd");
        assert!(json.get("rottenTomatoes").is_none());
    }

    #[test]
    fn test_csv_writer() {
        let mut writer = RecordWriter::start(Vec::new(), OutputFormat::Csv).unwrap();
        writer.write(&shrek()).unwrap();
        let out = String::from_utf8(writer.finish().unwrap()).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], CSV_HEADERS.join(","));
        assert!(lines[1].starts_with("Shrek,81.5,"));
    }

    #[test]
    fn test_json_writer_is_a_valid_array() {
        let empty = RecordWriter::start(Vec::new(), OutputFormat::Json).unwrap();
        let out = String::from_utf8(empty.finish().unwrap()).unwrap();
        assert_eq!(out.trim(), "[]");

        let mut writer = RecordWriter::start(Vec::new(), OutputFormat::Json).unwrap();
        for _ in 0..3 {
            writer.write(&shrek()).unwrap();
        }
        assert_eq!(writer.written(), 3);
        let out = String::from_utf8(writer.finish().unwrap()).unwrap();

        let parsed: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.len(), 3);
    }
}
