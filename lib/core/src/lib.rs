//! # argrisk Core
//!
//! Core library for antimicrobial-resistance gene risk lookup.
//!
//! This crate provides the data model and the scoring pipeline:
//!
//! - [`normalize()`] - maps raw spreadsheet headers onto the canonical [`Attribute`] vocabulary
//! - [`ReferenceDataset`] - the immutable gene table, indexed by lookup key
//! - [`DatasetHandle`] - load-once access to a dataset shared across requests
//! - [`lookup()`] / [`resolve_all`] - single and bulk gene lookup, exact or fuzzy
//! - [`compute`] - abundance-weighted risk index over a sample
//! - [`ResultTable`] - structured results with CSV export
//!
//! ## Example
//!
//! ```rust
//! use argrisk_core::{ReferenceDataset, MatchSettings, AbundanceEntry, ClampPolicy, compute};
//!
//! let dataset = ReferenceDataset::from_text(
//!     "Genes,Final Risk score\ngeneA,2.0\nmecA,0.5\n",
//! ).unwrap();
//!
//! let entries = vec![
//!     AbundanceEntry::new("geneA", Some(10.0)),
//!     AbundanceEntry::new("geneB", Some(3.5)),
//! ];
//! let index = compute(&dataset, &entries, "Final_Risk_score", &MatchSettings::exact(), ClampPolicy::None).unwrap();
//! assert_eq!(index.total, 20.0);
//! assert_eq!(index.display_total(), "20");
//! ```

pub mod abundance;
pub mod attribute;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod lookup;
pub mod normalize;
pub mod record;
pub mod risk;
pub mod table;

pub use abundance::{parse_pasted, parse_table, AbundanceEntry};
pub use attribute::{Attribute, COLUMN_ALIASES};
pub use config::{MatchSettings, RiskSettings, Settings};
pub use dataset::{DatasetHandle, ReferenceDataset};
pub use error::{Error, Result};
pub use export::{bulk_table, record_table, risk_table, ResultTable};
pub use lookup::{lookup, parse_query_lines, resolve_all, resolve_query, LookupOutcome, MatchNote, QueryResult, SimilarMatch};
pub use normalize::{normalize, sanitize_header, ResolvedSchema};
pub use record::{to_percent, GeneRecord};
pub use risk::{compute, format_significant, ClampPolicy, JoinedRow, RiskIndex};

pub use argrisk_similarity::MatchMode;
