//! Tie-breaking between equally close matches.
//!
//! The matcher leaves ties in place. Sources resolve them here with a
//! domain-specific order, e.g. "highest critic score" or "most recent year".

use std::cmp::Ordering;

use crate::similarity::SimilarityMatcher;

/// Return the maximum element under `compare`.
///
/// On an equal comparison the later element wins, so a sequence of equals
/// yields its last element. `None` for empty input.
pub fn highest_by<T, F>(items: Vec<T>, mut compare: F) -> Option<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut items = items.into_iter();
    let mut highest = items.next()?;

    for item in items {
        if compare(&highest, &item) != Ordering::Greater {
            highest = item;
        }
    }

    Some(highest)
}

/// Order two optional scores; a missing score always loses.
pub fn compare_scores(a: Option<f32>, b: Option<f32>) -> Ordering {
    match (a, b) {
        (None, _) => Ordering::Less,
        (_, None) => Ordering::Greater,
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Order two optional release years; the most recent wins and a missing year loses.
pub fn compare_years(a: Option<u16>, b: Option<u16>) -> Ordering {
    match (a, b) {
        (None, _) => Ordering::Less,
        (_, None) => Ordering::Greater,
        (Some(a), Some(b)) => a.cmp(&b),
    }
}

/// Arithmetic mean, `None` for an empty slice.
pub fn average(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }

    let total: f32 = values.iter().sum();
    Some(total / values.len() as f32)
}

/// Narrow `candidates` to the closest names, then settle ties with `tie_breaker`.
///
/// This is the synchronous path. Sources that need remote data to break ties
/// call [`SimilarityMatcher::closest_matches`] and rank afterwards.
pub fn best_match<T, N, C>(
    matcher: &SimilarityMatcher,
    query: &str,
    candidates: Vec<T>,
    name_of: N,
    tie_breaker: C,
) -> Option<T>
where
    N: Fn(&T) -> &str,
    C: FnMut(&T, &T) -> Ordering,
{
    let matches = matcher.closest_matches(query, candidates, name_of);
    highest_by(matches, tie_breaker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_by() {
        let by_value = |a: &i32, b: &i32| a.cmp(b);

        assert_eq!(highest_by(Vec::<i32>::new(), by_value), None);
        assert_eq!(highest_by(vec![2], by_value), Some(2));
        assert_eq!(highest_by(vec![3, 1, 2], by_value), Some(3));
    }

    #[test]
    fn test_highest_by_prefers_later_on_equal() {
        let items = vec![("first", 5), ("second", 5), ("low", 1)];
        let highest = highest_by(items, |a, b| a.1.cmp(&b.1));
        assert_eq!(highest, Some(("second", 5)));
    }

    #[test]
    fn test_compare_scores_missing_loses() {
        assert_eq!(compare_scores(None, Some(10.0)), Ordering::Less);
        assert_eq!(compare_scores(Some(10.0), None), Ordering::Greater);
        assert_eq!(compare_scores(Some(88.0), Some(37.0)), Ordering::Greater);
        assert_eq!(compare_scores(Some(37.0), Some(37.0)), Ordering::Equal);
    }

    #[test]
    fn test_compare_years_most_recent_wins() {
        assert_eq!(compare_years(Some(2018), Some(2001)), Ordering::Greater);
        assert_eq!(compare_years(None, Some(2001)), Ordering::Less);
        assert_eq!(compare_years(Some(2001), None), Ordering::Greater);
    }

    #[test]
    fn test_average() {
        assert_eq!(average(&[]), None);
        assert_eq!(average(&[1.0]), Some(1.0));
        assert_eq!(average(&[1.0, 3.0]), Some(2.0));
    }

    #[test]
    fn test_best_match_breaks_tie_by_score() {
        // same title twice, the remake has a lower critic score
        let candidates = vec![("Shrek (2001)", Some(88.0)), ("Shrek (2001)", Some(37.0))];

        let best = best_match(
            &SimilarityMatcher::new(),
            "shrek",
            candidates,
            |c| c.0,
            |a, b| compare_scores(a.1, b.1),
        );

        assert_eq!(best, Some(("Shrek (2001)", Some(88.0))));
    }

    #[test]
    fn test_best_match_none_when_nothing_matches() {
        let best = best_match(
            &SimilarityMatcher::new(),
            "shrek",
            vec![("Up (2009)", Some(98.0))],
            |c| c.0,
            |a, b| compare_scores(a.1, b.1),
        );

        assert_eq!(best, None);
    }
}
