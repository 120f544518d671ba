//! Query-to-corpus matching
//!
//! Resolves a free-text query against an ordered corpus of lookup keys, either by
//! equality or by [`weighted_ratio`] similarity. All functions are pure and keep the
//! corpus order as the tie-break: among equal scores the earliest entry wins.

use crate::distance::weighted_ratio;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How a query is resolved against the corpus
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Trimmed, lower-cased equality
    Exact,
    /// Weighted-ratio similarity with a cutoff
    #[default]
    Fuzzy,
}

impl MatchMode {
    pub fn from_fuzzy_flag(fuzzy: bool) -> Self {
        if fuzzy { MatchMode::Fuzzy } else { MatchMode::Exact }
    }
}

/// A scored corpus entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate<'a> {
    /// Position of the entry in the corpus
    pub index: usize,
    /// The corpus key
    pub key: &'a str,
    /// Similarity in [0, 100]
    pub score: f64,
}

/// Normalizes a query the same way corpus keys are built: trimmed and lower-cased
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Top `limit` corpus entries by descending similarity
///
/// The sort is stable, so entries with equal scores stay in corpus order.
pub fn match_best<'a, S: AsRef<str>>(
    query: &str,
    corpus: &'a [S],
    limit: usize,
) -> Vec<Candidate<'a>> {
    if limit == 0 {
        return Vec::new();
    }

    let query = normalize_query(query);
    let mut scored: Vec<Candidate<'a>> = corpus
        .iter()
        .enumerate()
        .map(|(index, key)| {
            let key = key.as_ref();
            Candidate { index, key, score: weighted_ratio(&query, key) }
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(limit);
    scored
}

/// Single best corpus entry, accepted only if its score reaches `cutoff`
pub fn match_one<'a, S: AsRef<str>>(
    query: &str,
    corpus: &'a [S],
    cutoff: f64,
) -> Option<Candidate<'a>> {
    let query = normalize_query(query);
    let mut best: Option<Candidate<'a>> = None;

    for (index, key) in corpus.iter().enumerate() {
        let key = key.as_ref();
        let score = weighted_ratio(&query, key);

        // Strictly greater keeps the first occurrence on ties
        if best.map_or(true, |b| score > b.score) {
            best = Some(Candidate { index, key, score });
            if score >= 100.0 {
                break;
            }
        }
    }

    best.filter(|b| b.score >= cutoff)
}

/// Position of the first corpus entry equal to the normalized query
pub fn match_exact<S: AsRef<str>>(query: &str, corpus: &[S]) -> Option<usize> {
    let query = normalize_query(query);
    corpus.iter().position(|key| key.as_ref() == query)
}
