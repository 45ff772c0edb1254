//! Closest-title matching over noisy search results.
//!
//! ## Algorithm
//! 1. Normalize the query and every candidate name (lowercase, keep only
//!    `a-z`, `0-9`, `(` and `)`)
//! 2. Score each candidate by longest-common-subsequence length against the query
//! 3. A candidate with a higher LCS than the running best replaces the result set
//! 4. A candidate with an equal LCS is compared by edit distance:
//!    - strictly smaller distance replaces the result set
//!    - equal distance joins it (ties are preserved)
//! 5. Candidates below the LCS floor never enter the result set
//!
//! Ties are left for the caller. See [`crate::ranking`] for resolving them.

use tracing::debug;

/// LCS score a candidate has to reach before it is considered at all.
///
/// A candidate scoring exactly the floor can still be returned, since it
/// equals the initial best.
pub const DEFAULT_MIN_LCS: usize = 3;

/// Picks the candidates whose names are closest to a query.
///
/// The matcher is stateless between calls, so one value can be shared freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimilarityMatcher {
    min_lcs: usize,
}

impl SimilarityMatcher {
    /// Create a matcher with the default LCS floor.
    pub fn new() -> Self {
        Self {
            min_lcs: DEFAULT_MIN_LCS,
        }
    }

    /// Configure the LCS floor (default: 3)
    pub fn with_min_lcs(mut self, min_lcs: usize) -> Self {
        self.min_lcs = min_lcs;
        self
    }

    pub fn min_lcs(&self) -> usize {
        self.min_lcs
    }

    /// Return every candidate judged equally closest to `query`.
    ///
    /// # Arguments
    /// * `query` - Free-text title typed by the user
    /// * `candidates` - Search results, consumed so the winners can be returned by value
    /// * `name_of` - Projection from a candidate to the name it should be matched on
    ///
    /// # Returns
    /// The best candidates in input order, or an empty Vec when nothing
    /// reaches the floor. An empty result is "not found", not an error.
    pub fn closest_matches<T, F>(&self, query: &str, candidates: Vec<T>, name_of: F) -> Vec<T>
    where
        F: Fn(&T) -> &str,
    {
        if candidates.is_empty() {
            return Vec::new();
        }

        let query = normalize(query);
        let total = candidates.len();

        let mut best_matches: Vec<T> = Vec::new();
        let mut best_lcs = self.min_lcs; // bigger is better
        let mut best_levenshtein = usize::MAX; // smaller is better

        for candidate in candidates {
            let name = normalize(name_of(&candidate));
            let lcs = lcs_len(&query, &name);

            if lcs > best_lcs {
                best_lcs = lcs;
                best_levenshtein = strsim::levenshtein(&query, &name);
                best_matches.clear();
                best_matches.push(candidate);
            } else if lcs == best_lcs {
                let levenshtein = strsim::levenshtein(&query, &name);
                if levenshtein <= best_levenshtein {
                    if levenshtein < best_levenshtein {
                        best_matches.clear();
                    }
                    best_levenshtein = levenshtein;
                    best_matches.push(candidate);
                }
            }
        }

        debug!(
            "Matched {:?}: {} of {} candidates (lcs: {}, levenshtein: {})",
            query,
            best_matches.len(),
            total,
            best_lcs,
            best_levenshtein
        );

        best_matches
    }
}

impl Default for SimilarityMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// [`SimilarityMatcher::closest_matches`] with the default floor.
pub fn closest_matches<T, F>(query: &str, candidates: Vec<T>, name_of: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    SimilarityMatcher::new().closest_matches(query, candidates, name_of)
}

/// Lowercase and strip everything except ASCII alphanumerics and parentheses.
///
/// Parentheses survive so that "(2001)" style disambiguators still count.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '(' || *c == ')')
        .collect()
}

/// Length of the longest common subsequence of `a` and `b`, counted in chars.
pub fn lcs_len(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in &a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
