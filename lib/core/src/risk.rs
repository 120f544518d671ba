//! Risk index aggregation
//!
//! `Risk Index = Σ (Abundance × Risk score)` over a sample's genes. Every entry survives
//! the join with the reference dataset (left join). A missing or non-numeric risk score
//! counts as 0; an unparseable abundance yields no product and is left out of the sum.

use crate::abundance::AbundanceEntry;
use crate::config::MatchSettings;
use crate::dataset::ReferenceDataset;
use crate::error::{Error, Result};
use crate::lookup::{resolve_query, MatchNote};
use crate::record::{gene_key, parse_number, GeneRecord};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

/// Significant digits used when displaying a total
pub const TOTAL_DISPLAY_DIGITS: usize = 6;

/// Post-processing applied to each row's risk score after the missing-to-zero default
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClampPolicy {
    /// Scores are used as stored
    #[default]
    None,
    /// Scores are clamped to [0, 1]
    UnitInterval,
}

impl ClampPolicy {
    pub fn apply(self, score: f64) -> f64 {
        match self {
            ClampPolicy::None => score,
            ClampPolicy::UnitInterval => score.clamp(0.0, 1.0),
        }
    }
}

impl FromStr for ClampPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" => Ok(ClampPolicy::None),
            "unit" | "unit_interval" | "unit-interval" => Ok(ClampPolicy::UnitInterval),
            other => Err(Error::InvalidConfig(format!("unknown clamp policy '{}'", other))),
        }
    }
}

/// One sample entry joined with its reference row
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow<'a> {
    /// Gene name as supplied
    pub query: String,
    pub query_key: String,
    pub record: Option<&'a GeneRecord>,
    pub note: MatchNote,
    pub abundance: Option<f64>,
    pub risk_score: f64,
    /// `abundance × risk_score`, `None` when the abundance did not parse
    pub product: Option<f64>,
}

/// Joined rows and their abundance-weighted total
#[derive(Debug, Clone, PartialEq)]
pub struct RiskIndex<'a> {
    /// Normalized name of the score column used
    pub score_column: String,
    pub rows: Vec<JoinedRow<'a>>,
    pub total: f64,
}

impl RiskIndex<'_> {
    /// The total with [`TOTAL_DISPLAY_DIGITS`] significant digits
    pub fn display_total(&self) -> String {
        format_significant(self.total, TOTAL_DISPLAY_DIGITS)
    }

    pub fn matched_count(&self) -> usize {
        self.rows.iter().filter(|r| r.record.is_some()).count()
    }
}

/// Computes the risk index of a sample
///
/// Fails with [`Error::Column`] before any matching if `score_attribute` is not a column
/// of the dataset.
pub fn compute<'a>(
    dataset: &'a ReferenceDataset,
    entries: &[AbundanceEntry],
    score_attribute: &str,
    settings: &MatchSettings,
    clamp: ClampPolicy,
) -> Result<RiskIndex<'a>> {
    let score_column = dataset.resolve_column(score_attribute)?;

    let rows: Vec<JoinedRow<'a>> = entries
        .iter()
        .map(|entry| {
            let query_key = gene_key(&entry.gene);
            let resolution = resolve_query(dataset, &query_key, settings);
            let risk_score = clamp.apply(row_score(resolution.record, &score_column));
            JoinedRow {
                query: entry.gene.clone(),
                query_key,
                record: resolution.record,
                note: resolution.note,
                abundance: entry.abundance,
                risk_score,
                product: entry.abundance.map(|a| a * risk_score),
            }
        })
        .collect();

    let total: f64 = rows.iter().filter_map(|r| r.product).sum();

    let index = RiskIndex { score_column, rows, total };
    info!(
        "Risk index over {}: {} entries, {} matched, total {}",
        index.score_column,
        index.rows.len(),
        index.matched_count(),
        index.display_total()
    );
    Ok(index)
}

/// Score of a joined row; absent rows and non-numeric cells count as zero
fn row_score(record: Option<&GeneRecord>, column: &str) -> f64 {
    record.and_then(|r| r.value(column)).and_then(parse_number).unwrap_or(0.0)
}

/// Formats like C's `%.<digits>g`: fixed notation for moderate exponents, scientific
/// otherwise, trailing zeros removed
pub fn format_significant(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let digits = digits.max(1);
    let scientific = format!("{:.*e}", digits - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some(parts) => parts,
        None => return scientific,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= digits as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
