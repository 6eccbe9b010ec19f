use std::cmp::Ordering;

/// The kind of match that was produced, from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// General fuzzy subsequence match.
    Fuzzy,
    /// `candidate` (or its last path segment) starts with `query`.
    Prefix,
    /// The last path segment equals `query` (ASCII case-insensitive).
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchScore {
    pub kind: MatchKind,
    pub score: i32,
}

/// Sort key: match kind first, then score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankKey {
    kind_rank: u8,
    score: i32,
}

impl MatchScore {
    pub fn rank_key(self) -> RankKey {
        let kind_rank = match self.kind {
            MatchKind::Fuzzy => 0,
            MatchKind::Prefix => 1,
            MatchKind::Exact => 2,
        };
        RankKey {
            kind_rank,
            score: self.score,
        }
    }
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.kind_rank, self.score).cmp(&(other.kind_rank, other.score))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

const MIN_SCORE: i32 = i32::MIN / 4;
const BASE_MATCH: i32 = 10;
const BONUS_WORD_START: i32 = 15;
const BONUS_CONSECUTIVE: i32 = 5;
const BONUS_SAME_CASE: i32 = 2;
const GAP_PENALTY: i32 = 1;
const LEADING_PENALTY: i32 = 1;
const TRAILING_PENALTY: i32 = 1;
const PREFIX_BASE: i32 = 1_000_000;

#[inline]
fn fold(b: u8) -> u8 {
    b.to_ascii_lowercase()
}

#[inline]
fn is_separator(b: u8) -> bool {
    matches!(
        b,
        b'_' | b'-' | b' ' | b'/' | b'.' | b':' | b'#' | b'(' | b')' | b'[' | b']' | b'?' | b'!'
    )
}

fn is_word_start(candidate: &[u8], i: usize) -> bool {
    if i == 0 {
        return true;
    }
    let prev = candidate[i - 1];
    let cur = candidate[i];
    is_separator(prev)
        || (prev.is_ascii_lowercase() && cur.is_ascii_uppercase())
        || (prev.is_ascii_alphabetic() && cur.is_ascii_digit())
        || (prev.is_ascii_digit() && cur.is_ascii_alphabetic())
}

fn starts_with_folded(candidate: &[u8], query_folded: &[u8]) -> bool {
    candidate.len() >= query_folded.len()
        && candidate
            .iter()
            .zip(query_folded)
            .all(|(&c, &q)| fold(c) == q)
}

/// Byte offset of the last path segment (after the final `::`, `#` or `.`).
fn last_segment_start(candidate: &[u8]) -> usize {
    candidate
        .iter()
        .rposition(|&b| matches!(b, b':' | b'#' | b'.'))
        .map(|pos| pos + 1)
        .filter(|&start| start < candidate.len())
        .unwrap_or(0)
}

/// Reusable matcher; keeps its DP rows between candidates.
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    query: Vec<u8>,
    query_folded: Vec<u8>,
    dp_prev: Vec<i32>,
    dp_cur: Vec<i32>,
}

impl FuzzyMatcher {
    pub fn new(query: &str) -> Self {
        let query = query.trim().as_bytes().to_vec();
        let query_folded = query.iter().copied().map(fold).collect();
        Self {
            query,
            query_folded,
            dp_prev: Vec::new(),
            dp_cur: Vec::new(),
        }
    }

    pub fn score(&mut self, candidate: &str) -> Option<MatchScore> {
        let c = candidate.as_bytes();
        if self.query.is_empty() {
            return Some(MatchScore {
                kind: MatchKind::Prefix,
                score: 0,
            });
        }

        let name = &c[last_segment_start(c)..];
        let length_penalty = i32::try_from(c.len()).unwrap_or(i32::MAX / 2);
        if name.len() == self.query_folded.len() && starts_with_folded(name, &self.query_folded) {
            return Some(MatchScore {
                kind: MatchKind::Exact,
                score: PREFIX_BASE - length_penalty,
            });
        }
        if starts_with_folded(name, &self.query_folded) || starts_with_folded(c, &self.query_folded)
        {
            // Shorter candidates win among prefix matches.
            return Some(MatchScore {
                kind: MatchKind::Prefix,
                score: PREFIX_BASE - length_penalty,
            });
        }

        self.subsequence_score(c).map(|score| MatchScore {
            kind: MatchKind::Fuzzy,
            score,
        })
    }

    fn subsequence_score(&mut self, candidate: &[u8]) -> Option<i32> {
        let n = candidate.len();
        if self.query.len() > n {
            return None;
        }

        self.dp_prev.clear();
        self.dp_prev.resize(n, MIN_SCORE);
        self.dp_cur.clear();
        self.dp_cur.resize(n, MIN_SCORE);

        let bonus = |q: u8, j: usize| {
            let mut score = BASE_MATCH;
            if is_word_start(candidate, j) {
                score += BONUS_WORD_START;
            }
            if q == candidate[j] {
                score += BONUS_SAME_CASE;
            }
            score
        };

        let (q0, q0_folded) = (self.query[0], self.query_folded[0]);
        for j in 0..n {
            if fold(candidate[j]) == q0_folded {
                self.dp_prev[j] = bonus(q0, j) - LEADING_PENALTY * j as i32;
            }
        }

        for i in 1..self.query.len() {
            let (q, q_folded) = (self.query[i], self.query_folded[i]);
            self.dp_cur.fill(MIN_SCORE);

            // Best `dp_prev[k] + GAP_PENALTY * (k + 1)` over all `k < j`.
            let mut running_max = MIN_SCORE;
            for j in 0..n {
                if j > 0 && self.dp_prev[j - 1] > MIN_SCORE / 2 {
                    running_max = running_max.max(self.dp_prev[j - 1] + GAP_PENALTY * j as i32);
                }
                if fold(candidate[j]) != q_folded {
                    continue;
                }

                let with_gap = if running_max > MIN_SCORE / 2 {
                    running_max - GAP_PENALTY * j as i32
                } else {
                    MIN_SCORE
                };
                let consecutive = if j > 0 && self.dp_prev[j - 1] > MIN_SCORE / 2 {
                    self.dp_prev[j - 1] + BONUS_CONSECUTIVE
                } else {
                    MIN_SCORE
                };
                let best = with_gap.max(consecutive);
                if best > MIN_SCORE / 2 {
                    self.dp_cur[j] = best + bonus(q, j);
                }
            }
            std::mem::swap(&mut self.dp_prev, &mut self.dp_cur);
        }

        self.dp_prev
            .iter()
            .enumerate()
            .filter(|&(_, &score)| score > MIN_SCORE / 2)
            .map(|(j, &score)| score - TRAILING_PENALTY * (n - 1 - j) as i32)
            .max()
    }
}

/// One-shot fuzzy match of `query` against an object path.
pub fn fuzzy_match(query: &str, candidate: &str) -> Option<MatchScore> {
    FuzzyMatcher::new(query).score(candidate)
}
