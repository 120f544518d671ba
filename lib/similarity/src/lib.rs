//! # argrisk Similarity
//!
//! Approximate string matching for gene names.
//!
//! - [`weighted_ratio`] - a 0-100 similarity tolerant to case, token order and
//!   partial overlap (`"blaTEM"` vs `"bla_tem_1"`)
//! - [`match_best`] / [`match_one`] / [`match_exact`] - resolve a query against an
//!   ordered corpus of lookup keys with corpus-order tie-breaking
//!
//! ## Example
//!
//! ```rust
//! use argrisk_similarity::{match_best, match_one};
//!
//! let corpus = vec!["bla_tem_1".to_string(), "meca".to_string(), "dfra24".to_string()];
//!
//! let top = match_best("DfrA24", &corpus, 2);
//! assert_eq!(top[0].key, "dfra24");
//! assert_eq!(top[0].score, 100.0);
//!
//! let hit = match_one("blaTEM", &corpus, 70.0).unwrap();
//! assert_eq!(hit.key, "bla_tem_1");
//! ```

pub mod distance;
pub mod matcher;

pub use distance::{
    ratio,
    partial_ratio,
    token_sort_ratio,
    token_set_ratio,
    partial_token_ratio,
    weighted_ratio,
};
pub use matcher::{match_best, match_one, match_exact, normalize_query, Candidate, MatchMode};
