//! Lexical fuzzy matching for documentation object paths.
//!
//! Matching is ASCII case-insensitive over UTF-8 bytes. Candidates are object
//! paths such as `Net::HTTP#get` or `Array.new`, so `:`, `#` and `.` act as word
//! separators alongside the usual punctuation and camelCase boundaries.
//!
//! The scorer is pluggable: query layers take a [`Scorer`] and default to
//! [`SubsequenceScorer`].

#![forbid(unsafe_code)]

mod scoring;

pub use scoring::{fuzzy_match, FuzzyMatcher, MatchKind, MatchScore, RankKey};

/// A string-distance function used to rank search candidates.
pub trait Scorer: Send + Sync {
    /// Score `candidate` against `query`; `None` means "no match".
    fn score(&self, query: &str, candidate: &str) -> Option<MatchScore>;
}

/// Default [`Scorer`]: exact name, then prefix, then fuzzy subsequence matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubsequenceScorer;

impl Scorer for SubsequenceScorer {
    fn score(&self, query: &str, candidate: &str) -> Option<MatchScore> {
        fuzzy_match(query, candidate)
    }
}

impl<F> Scorer for F
where
    F: Fn(&str, &str) -> Option<MatchScore> + Send + Sync,
{
    fn score(&self, query: &str, candidate: &str) -> Option<MatchScore> {
        self(query, candidate)
    }
}
