//! Result tables and CSV export
//!
//! Bulk lookups and risk breakdowns are flattened into a [`ResultTable`]: ordered column
//! names and rows of optional cells. `None` cells serialize as empty CSV fields.

use crate::dataset::ReferenceDataset;
use crate::error::{Error, Result};
use crate::lookup::QueryResult;
use crate::record::GeneRecord;
use crate::risk::RiskIndex;
use serde::{Deserialize, Serialize};

pub const BULK_EXPORT_FILENAME: &str = "bulk_lookup.csv";
pub const RISK_EXPORT_FILENAME: &str = "risk_index_breakdown.csv";

/// Ordered named-field records ready for rendering or export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl ResultTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell of a row by column name
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(col)?.as_deref()
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| Error::Serialization(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Reads a table written by [`ResultTable::to_csv`]; empty fields become `None`
    pub fn from_csv(text: &str) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|f| if f.is_empty() { None } else { Some(f.to_string()) })
                    .collect(),
            );
        }
        Ok(Self { columns, rows })
    }
}

fn record_cells<'a>(
    record: Option<&'a GeneRecord>,
    columns: &'a [String],
) -> impl Iterator<Item = Option<String>> + 'a {
    columns
        .iter()
        .map(move |c| record.and_then(|r| r.value(c)).map(str::to_string))
}

/// Fixed leading headers followed by the display columns, a display column that repeats
/// an earlier header gets the first free `_2`, `_3`, ... suffix
fn export_columns(fixed: &[&str], display: &[String]) -> Vec<String> {
    let mut columns: Vec<String> = fixed.iter().map(|s| s.to_string()).collect();
    for name in display {
        let mut candidate = name.clone();
        let mut n = 2;
        while columns.contains(&candidate) {
            candidate = format!("{}_{}", name, n);
            n += 1;
        }
        columns.push(candidate);
    }
    columns
}

fn number_cell(value: Option<f64>) -> Option<String> {
    value.map(|v| v.to_string())
}

/// Bulk lookup results: `Query`, `Match`, `Note`, then the dataset's display columns
pub fn bulk_table(dataset: &ReferenceDataset, results: &[QueryResult<'_>]) -> ResultTable {
    let display = dataset.display_columns();
    let mut table = ResultTable::new(export_columns(&["Query", "Match", "Note"], &display));

    for result in results {
        let mut row = vec![
            Some(result.query.clone()),
            Some(result.match_name().to_string()),
            Some(result.note.to_string()),
        ];
        row.extend(record_cells(result.record, &display));
        table.rows.push(row);
    }
    table
}

/// Risk breakdown: query gene, matched gene, abundance, score, product, note, then the
/// remaining display columns
pub fn risk_table(dataset: &ReferenceDataset, index: &RiskIndex<'_>) -> ResultTable {
    let display: Vec<String> = dataset
        .display_columns()
        .into_iter()
        .filter(|c| c != "Genes")
        .collect();

    let mut table = ResultTable::new(export_columns(
        &["Genes_q", "Genes", "Abundance", "Risk_Score", "Product", "Note"],
        &display,
    ));

    for joined in &index.rows {
        let mut row = vec![
            Some(joined.query.clone()),
            joined.record.map(|r| r.genes.clone()),
            number_cell(joined.abundance),
            number_cell(Some(joined.risk_score)),
            number_cell(joined.product),
            Some(joined.note.to_string()),
        ];
        row.extend(record_cells(joined.record, &display));
        table.rows.push(row);
    }
    table
}

/// Single record as a one-row table over the display columns
pub fn record_table(dataset: &ReferenceDataset, record: &GeneRecord) -> ResultTable {
    let display = dataset.display_columns();
    let row = record_cells(Some(record), &display).collect();
    ResultTable { columns: display, rows: vec![row] }
}
