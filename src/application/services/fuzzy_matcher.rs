use std::sync::Arc;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

/// A candidate that matched the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranked {
    /// Position of the candidate in the input slice.
    pub index: usize,
    /// Match score, higher is better.
    pub score: i64,
}

/// Skim-based fuzzy scoring.
#[derive(Clone)]
pub struct FuzzySearcher {
    matcher: Arc<SkimMatcherV2>,
}

impl Default for FuzzySearcher {
    fn default() -> Self {
        Self {
            matcher: Arc::new(SkimMatcherV2::default()),
        }
    }
}

impl FuzzySearcher {
    /// Creates a searcher with default scoring.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Score of `pattern` against `choice`, `None` when it does not match.
    #[must_use]
    pub fn score(&self, choice: &str, pattern: &str) -> Option<i64> {
        self.matcher.fuzzy_match(choice, pattern)
    }

    /// Ranks `candidates` against `query`, best first.
    ///
    /// Candidates that do not match are left out. Equal scores keep input
    /// order. An empty query matches everything with score 0, in input order.
    #[must_use]
    pub fn rank<S: AsRef<str>>(&self, query: &str, candidates: &[S]) -> Vec<Ranked> {
        if query.is_empty() {
            return (0..candidates.len())
                .map(|index| Ranked { index, score: 0 })
                .collect();
        }

        let mut ranked: Vec<Ranked> = candidates
            .iter()
            .enumerate()
            .filter_map(|(index, candidate)| {
                self.score(candidate.as_ref(), query)
                    .map(|score| Ranked { index, score })
            })
            .collect();

        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_excludes_non_matches() {
        let ranked = FuzzySearcher::new().rank("jo", &["John", "Joan", "Mark"]);
        let indices: Vec<usize> = ranked.iter().map(|r| r.index).collect();

        assert_eq!(indices.len(), 2);
        assert!(indices.contains(&0));
        assert!(indices.contains(&1));
        assert!(!indices.contains(&2));
    }

    #[test]
    fn test_empty_query_keeps_everything_in_order() {
        let ranked = FuzzySearcher::new().rank("", &["b", "a", "c"]);

        assert_eq!(
            ranked,
            vec![
                Ranked { index: 0, score: 0 },
                Ranked { index: 1, score: 0 },
                Ranked { index: 2, score: 0 },
            ]
        );
    }

    #[test]
    fn test_ties_keep_input_order() {
        let ranked = FuzzySearcher::new().rank("ab", &["xab", "ab", "ab"]);
        let indices: Vec<usize> = ranked.iter().map(|r| r.index).collect();

        let first = indices.iter().position(|i| *i == 1).unwrap();
        let second = indices.iter().position(|i| *i == 2).unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_rank_is_deterministic() {
        let searcher = FuzzySearcher::new();
        let candidates = ["alice", "alicia", "malice", "bob"];
        assert_eq!(
            searcher.rank("ali", &candidates),
            searcher.rank("ali", &candidates)
        );
    }

    #[test]
    fn test_empty_candidates() {
        let empty: [&str; 0] = [];
        assert!(FuzzySearcher::new().rank("x", &empty).is_empty());
        assert!(FuzzySearcher::new().rank("", &empty).is_empty());
    }
}
