//! # Matcher Crate
//!
//! Fuzzy title matching for review-site search results.
//!
//! ## Components
//!
//! - **similarity**: Picks the search results closest to a free-text title,
//!   using longest common subsequence first and edit distance second
//! - **ranking**: Resolves the remaining ties (highest score, most recent year)
//!
//! ## Example Usage
//!
//! ```ignore
//! use matcher::{closest_matches, highest_by, compare_scores};
//!
//! let matches = closest_matches("shrek", results, |r| r.name.as_str());
//! let best = highest_by(matches, |a, b| compare_scores(a.critic_score, b.critic_score));
//! ```

pub mod ranking;
pub mod similarity;

pub use ranking::{average, best_match, compare_scores, compare_years, highest_by};
pub use similarity::{DEFAULT_MIN_LCS, SimilarityMatcher, closest_matches, lcs_len, normalize};
