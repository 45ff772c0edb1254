//! Result types shared by all review sites.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::extract::leading_number;

/// A single rating as shown on a review site.
///
/// Serialized as a plain number, `"tbd"` or `"not found"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    Value(f32),
    /// The site lists the title but has not published a score yet
    Tbd,
    NotFound,
}

impl Score {
    /// Parse the text of a score element.
    ///
    /// Leading numeric text is enough ("8.1/10" is 8.1); anything else that
    /// isn't "tbd" counts as not found.
    pub fn parse(text: &str) -> Score {
        let text = text.trim();
        if text.eq_ignore_ascii_case("tbd") {
            return Score::Tbd;
        }

        match leading_number(text) {
            Some(value) => Score::Value(value),
            None => Score::NotFound,
        }
    }

    pub fn value(&self) -> Option<f32> {
        match self {
            Score::Value(value) => Some(*value),
            Score::Tbd | Score::NotFound => None,
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Value(value) => write!(f, "{}", value),
            Score::Tbd => f.write_str("tbd"),
            Score::NotFound => f.write_str("not found"),
        }
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Score::Value(value) => serializer.serialize_f32(*value),
            Score::Tbd => serializer.serialize_str("tbd"),
            Score::NotFound => serializer.serialize_str("not found"),
        }
    }
}

/// IMDB entry matched for a title
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImdbResult {
    pub name: String,
    pub url: String,
    /// Out of 10
    pub score: Score,
}

/// Metacritic entry matched for a title
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetacriticResult {
    pub name: String,
    pub url: String,
    /// Critic score, out of 100
    pub metascore: Score,
    /// User score, out of 10
    pub userscore: Score,
}

/// Rotten Tomatoes entry matched for a title
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RottenTomatoesResult {
    pub name: String,
    pub url: String,
    /// Tomatometer, percent
    pub critic_score: Score,
    /// Audience score, percent
    pub audience_score: Score,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_parse() {
        assert_eq!(Score::parse("8.1"), Score::Value(8.1));
        assert_eq!(Score::parse(" 75 "), Score::Value(75.0));
        assert_eq!(Score::parse("8.1/10"), Score::Value(8.1));
        assert_eq!(Score::parse("tbd"), Score::Tbd);
        assert_eq!(Score::parse(""), Score::NotFound);
        assert_eq!(Score::parse("n/a"), Score::NotFound);
    }

    #[test]
    fn test_score_display() {
        assert_eq!(Score::Value(7.5).to_string(), "7.5");
        assert_eq!(Score::Value(88.0).to_string(), "88");
        assert_eq!(Score::Tbd.to_string(), "tbd");
        assert_eq!(Score::NotFound.to_string(), "not found");
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = RottenTomatoesResult {
            name: "Shrek (2001)".to_string(),
            url: "https://www.rottentomatoes.com/m/shrek".to_string(),
            critic_score: Score::Value(88.0),
            audience_score: Score::NotFound,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["criticScore"], 88.0);
        assert_eq!(json["audienceScore"], "not found");
        assert_eq!(json["name"], "Shrek (2001)");
    }
}
