//! Single and bulk gene lookup
//!
//! A query resolves to the first reference row with an equal key (exact mode) or to the
//! best weighted-ratio candidate at or above the cutoff (fuzzy mode). Misses are regular
//! results carrying a [`MatchNote`], never errors.

use crate::config::MatchSettings;
use crate::dataset::ReferenceDataset;
use crate::record::GeneRecord;
use argrisk_similarity::{match_best, match_one, MatchMode};
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::debug;

/// How a query was (or was not) resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchNote {
    Exact,
    Fuzzy,
    NoExactMatch,
    NoFuzzyMatch { cutoff: u8 },
    /// Single lookup found no candidate at all; no cutoff is involved
    NoSimilarMatch,
}

impl MatchNote {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchNote::Exact | MatchNote::Fuzzy)
    }

    /// The miss note for the given settings
    pub fn miss(settings: &MatchSettings) -> Self {
        match settings.mode() {
            MatchMode::Exact => MatchNote::NoExactMatch,
            MatchMode::Fuzzy => MatchNote::NoFuzzyMatch { cutoff: settings.cutoff },
        }
    }
}

impl fmt::Display for MatchNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchNote::Exact => f.write_str("Exact"),
            MatchNote::Fuzzy => f.write_str("Fuzzy"),
            MatchNote::NoExactMatch => f.write_str("No exact match"),
            MatchNote::NoFuzzyMatch { cutoff } => write!(f, "No fuzzy match ≥{}", cutoff),
            MatchNote::NoSimilarMatch => f.write_str("No fuzzy match found"),
        }
    }
}

impl Serialize for MatchNote {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Resolution of one query against the dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'a> {
    pub record: Option<&'a GeneRecord>,
    pub note: MatchNote,
    /// Similarity of the accepted fuzzy candidate
    pub score: Option<f64>,
}

/// Resolves a single query; blank queries are misses without touching the matcher
pub fn resolve_query<'a>(
    dataset: &'a ReferenceDataset,
    query: &str,
    settings: &MatchSettings,
) -> Resolution<'a> {
    let miss = Resolution { record: None, note: MatchNote::miss(settings), score: None };
    if query.trim().is_empty() {
        return miss;
    }

    match settings.mode() {
        MatchMode::Exact => match dataset.lookup_exact(query) {
            Some(record) => Resolution { record: Some(record), note: MatchNote::Exact, score: None },
            None => miss,
        },
        MatchMode::Fuzzy => {
            let candidate = match_one(query, dataset.all_keys(), f64::from(settings.cutoff));
            match candidate.and_then(|c| dataset.row_at(c.key).map(|r| (r, c.score))) {
                Some((record, score)) => Resolution {
                    record: Some(record),
                    note: MatchNote::Fuzzy,
                    score: Some(score),
                },
                None => miss,
            }
        }
    }
}

/// One bulk lookup line and its outcome
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<'a> {
    pub query: String,
    pub record: Option<&'a GeneRecord>,
    pub note: MatchNote,
    pub score: Option<f64>,
}

impl QueryResult<'_> {
    /// Display name of the matched gene, empty on a miss
    pub fn match_name(&self) -> &str {
        self.record.map(|r| r.genes.as_str()).unwrap_or("")
    }
}

/// Splits pasted text into queries, dropping blank lines
pub fn parse_query_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolves every non-blank query, one result per query in input order
pub fn resolve_all<'a, S: AsRef<str>>(
    dataset: &'a ReferenceDataset,
    queries: &[S],
    settings: &MatchSettings,
) -> Vec<QueryResult<'a>> {
    let results: Vec<QueryResult<'a>> = queries
        .iter()
        .map(|q| q.as_ref().trim())
        .filter(|q| !q.is_empty())
        .map(|query| {
            let resolution = resolve_query(dataset, query, settings);
            QueryResult {
                query: query.to_string(),
                record: resolution.record,
                note: resolution.note,
                score: resolution.score,
            }
        })
        .collect();

    debug!(
        "Bulk resolve: {} queries, {} matched ({:?})",
        results.len(),
        results.iter().filter(|r| r.note.is_match()).count(),
        settings.mode()
    );
    results
}

/// A ranked alternative for a single lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarMatch {
    pub genes: String,
    pub gene_key: String,
    pub score: f64,
}

/// Result of an interactive single-gene lookup
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome<'a> {
    /// Blank query, nothing was searched
    Empty,
    Hit {
        record: &'a GeneRecord,
        note: MatchNote,
        /// Top candidates in fuzzy mode, empty in exact mode
        similar: Vec<SimilarMatch>,
    },
    Miss {
        note: MatchNote,
    },
}

/// Single-gene lookup
///
/// Exact mode returns the first row with the query's key. Fuzzy mode ranks the top
/// `limit` candidates and returns the best of them without applying the cutoff.
pub fn lookup<'a>(
    dataset: &'a ReferenceDataset,
    query: &str,
    settings: &MatchSettings,
) -> LookupOutcome<'a> {
    if query.trim().is_empty() {
        return LookupOutcome::Empty;
    }

    match settings.mode() {
        MatchMode::Exact => match dataset.lookup_exact(query) {
            Some(record) => LookupOutcome::Hit {
                record,
                note: MatchNote::Exact,
                similar: Vec::new(),
            },
            None => LookupOutcome::Miss { note: MatchNote::NoExactMatch },
        },
        MatchMode::Fuzzy => {
            let similar: Vec<SimilarMatch> = match_best(query, dataset.all_keys(), settings.limit)
                .into_iter()
                .filter_map(|c| {
                    dataset.row_at(c.key).map(|r| SimilarMatch {
                        genes: r.genes.clone(),
                        gene_key: c.key.to_string(),
                        score: c.score,
                    })
                })
                .collect();

            match similar.first().and_then(|best| dataset.row_at(&best.gene_key)) {
                Some(record) => LookupOutcome::Hit { record, note: MatchNote::Fuzzy, similar },
                None => LookupOutcome::Miss { note: MatchNote::NoSimilarMatch },
            }
        }
    }
}
