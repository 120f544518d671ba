//! # argrisk
//!
//! Antimicrobial-resistance gene (ARG) risk lookup.
//!
//! argrisk loads a reference table of resistance genes with categorical risk levels and
//! numeric risk scores, resolves user-supplied gene names against it (exactly or with a
//! weighted fuzzy ratio), and scores a sample as `Σ abundance × risk score`.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! argrisk --dataset genes_risk.csv serve --http-port 8080
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use argrisk::prelude::*;
//!
//! let dataset = ReferenceDataset::load("genes_risk.csv").unwrap();
//! let results = resolve_all(&dataset, &["mecA", "blaTEM"], &MatchSettings::default());
//! for result in &results {
//!     println!("{} -> {} ({})", result.query, result.match_name(), result.note);
//! }
//!
//! let entries = parse_pasted("mecA, 12.5\nvanA, 3");
//! let index = compute(&dataset, &entries, "Final_Risk_score", &MatchSettings::default(), ClampPolicy::None).unwrap();
//! println!("Risk Index: {}", index.display_total());
//! ```
//!
//! ## Crate Structure
//!
//! - `argrisk-similarity` - weighted fuzzy ratio and corpus matching
//! - `argrisk-core` - schema normalization, reference dataset, lookup, risk index, export
//! - `argrisk-api` - REST API

// Re-export core types
pub use argrisk_core::{
    bulk_table, compute, lookup, normalize, parse_pasted, parse_query_lines, parse_table,
    record_table, resolve_all, risk_table, AbundanceEntry, Attribute, ClampPolicy,
    DatasetHandle, Error, GeneRecord, LookupOutcome, MatchMode, MatchNote, MatchSettings,
    QueryResult, ReferenceDataset, ResultTable, RiskIndex, Result, Settings,
};

// Re-export API
pub use argrisk_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        compute, lookup, parse_pasted, parse_table, resolve_all, AbundanceEntry, ClampPolicy,
        DatasetHandle, Error, LookupOutcome, MatchNote, MatchSettings, ReferenceDataset,
        ResultTable, Result, RiskIndex, Settings,
    };
}

/// String similarity primitives
pub mod similarity {
    pub use argrisk_similarity::{match_best, match_one, weighted_ratio};
}
