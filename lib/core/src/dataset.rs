//! Reference dataset
//!
//! The in-memory gene table, built once from delimited text and read-only afterwards.
//! [`DatasetHandle`] defers the load to first use and guarantees it happens once.

use crate::attribute::Attribute;
use crate::error::{Error, Result};
use crate::normalize::{sanitize_header, ResolvedSchema};
use crate::record::{gene_key, GeneRecord, UNKNOWN};
use crate::table::{is_missing, read_delimited, RawTable};
use ahash::AHashMap;
use parking_lot::Mutex;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Name of the derived lookup-key column
pub const GENE_KEY_COLUMN: &str = "gene_key";

/// Immutable gene table indexed by lookup key
#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    schema: ResolvedSchema,
    records: Vec<GeneRecord>,
    /// One key per row, duplicates preserved
    keys: Vec<String>,
    /// key -> first row carrying it
    first_index: AHashMap<String, usize>,
    /// Pass-through columns in source order
    extra_columns: Vec<String>,
    delimiter: u8,
}

impl ReferenceDataset {
    /// Loads a dataset file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let dataset = Self::from_text(&text)?;
        info!(
            "Loaded {} genes ({} columns, delimiter {:?}) from {:?}",
            dataset.len(),
            dataset.schema.columns.len(),
            dataset.delimiter as char,
            path
        );
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::from_text(&text)
    }

    pub fn from_text(text: &str) -> Result<Self> {
        Self::from_table(read_delimited(text)?)
    }

    /// Builds the dataset from a parsed table
    ///
    /// Missing cells become [`UNKNOWN`]; numeric contexts treat that as no value.
    pub fn from_table(table: RawTable) -> Result<Self> {
        let schema = ResolvedSchema::resolve(&table.headers)?;
        debug!("Normalized columns: {:?}", schema.names());

        let extra_columns: Vec<String> = schema
            .columns
            .iter()
            .filter(|c| c.attribute.is_none() && c.name != GENE_KEY_COLUMN)
            .map(|c| c.name.clone())
            .collect();
        if schema.columns.iter().any(|c| c.name == GENE_KEY_COLUMN) {
            warn!("Source column '{}' is replaced by the derived key", GENE_KEY_COLUMN);
        }

        let mut records = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let mut record = GeneRecord::new(String::new());
            for (column, cell) in schema.columns.iter().zip(row) {
                let value = if is_missing(cell) { UNKNOWN.to_string() } else { cell.clone() };
                match column.attribute {
                    Some(Attribute::Genes) => {
                        record.gene_key = gene_key(&value);
                        record.genes = value;
                    }
                    Some(attribute) => record.set(attribute, value),
                    None if column.name == GENE_KEY_COLUMN => {}
                    None => {
                        record.extra.insert(column.name.clone(), value);
                    }
                }
            }
            records.push(record);
        }

        let keys: Vec<String> = records.iter().map(|r| r.gene_key.clone()).collect();
        let mut first_index = AHashMap::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            first_index.entry(key.clone()).or_insert(i);
        }
        if first_index.len() < keys.len() {
            debug!("{} rows share a gene key with an earlier row", keys.len() - first_index.len());
        }

        Ok(Self {
            schema,
            records,
            keys,
            first_index,
            extra_columns,
            delimiter: table.delimiter,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Delimiter the source was parsed with
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn schema(&self) -> &ResolvedSchema {
        &self.schema
    }

    pub fn records(&self) -> &[GeneRecord] {
        &self.records
    }

    /// Lookup keys in row order, duplicates preserved
    pub fn all_keys(&self) -> &[String] {
        &self.keys
    }

    /// First row whose key equals the trimmed, lower-cased query
    pub fn lookup_exact(&self, query: &str) -> Option<&GeneRecord> {
        self.row_at(&gene_key(query))
    }

    /// First row carrying an already normalized key
    pub fn row_at(&self, key: &str) -> Option<&GeneRecord> {
        self.first_index.get(key).map(|&i| &self.records[i])
    }

    pub fn record(&self, index: usize) -> Option<&GeneRecord> {
        self.records.get(index)
    }

    pub fn has_attribute(&self, attribute: Attribute) -> bool {
        self.schema.position(attribute).is_some()
    }

    pub fn present_levels(&self) -> Vec<Attribute> {
        Attribute::LEVELS.into_iter().filter(|a| self.has_attribute(*a)).collect()
    }

    pub fn present_scores(&self) -> Vec<Attribute> {
        Attribute::SCORES.into_iter().filter(|a| self.has_attribute(*a)).collect()
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    /// `Genes`, present levels, present scores, then pass-through columns
    pub fn display_columns(&self) -> Vec<String> {
        std::iter::once(Attribute::Genes)
            .chain(self.present_levels())
            .chain(self.present_scores())
            .map(|a| a.canonical_name().to_string())
            .chain(self.extra_columns.iter().cloned())
            .collect()
    }

    /// Score columns usable for a risk index, preferred first
    pub fn score_columns(&self) -> Vec<&'static str> {
        Attribute::RISK_CHOICES
            .into_iter()
            .filter(|a| self.has_attribute(*a))
            .map(|a| a.canonical_name())
            .collect()
    }

    pub fn default_score_column(&self) -> Option<&'static str> {
        self.score_columns().first().copied()
    }

    /// Resolves a user-supplied column name to a present column
    ///
    /// Aliases and spelling variants of a present score attribute resolve to its canonical
    /// column; gene and level columns are rejected. Other names must match a pass-through
    /// column.
    pub fn resolve_column(&self, name: &str) -> Result<String> {
        let sanitized = sanitize_header(name);
        if let Some(attribute) = Attribute::from_alias(&sanitized.to_lowercase()) {
            if attribute.is_score() && self.has_attribute(attribute) {
                return Ok(attribute.canonical_name().to_string());
            }
        }

        self.extra_columns
            .iter()
            .find(|c| **c == sanitized || *c == name)
            .cloned()
            .ok_or_else(|| {
                Error::Column(format!(
                    "'{}' is not a column of the reference dataset (available: {})",
                    name,
                    self.display_columns().join(", ")
                ))
            })
    }
}

/// Shared, lazily loaded dataset
///
/// The first `get_or_load` reads the file; concurrent first callers wait for that single
/// load and every caller receives the same `Arc`.
#[derive(Debug)]
pub struct DatasetHandle {
    path: Option<PathBuf>,
    dataset: OnceLock<Arc<ReferenceDataset>>,
    init: Mutex<()>,
}

impl DatasetHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            dataset: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// A handle around an already built dataset
    pub fn from_dataset(dataset: ReferenceDataset) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Arc::new(dataset));
        Self { path: None, dataset: cell, init: Mutex::new(()) }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.dataset.get().is_some()
    }

    pub fn get_or_load(&self) -> Result<Arc<ReferenceDataset>> {
        if let Some(dataset) = self.dataset.get() {
            return Ok(dataset.clone());
        }

        let _guard = self.init.lock();
        if let Some(dataset) = self.dataset.get() {
            return Ok(dataset.clone());
        }

        let path = self
            .path
            .as_ref()
            .ok_or_else(|| Error::InvalidConfig("dataset handle has no source path".to_string()))?;
        info!("Loading reference dataset from {:?}", path);
        let dataset = Arc::new(ReferenceDataset::load(path)?);
        let _ = self.dataset.set(dataset.clone());
        Ok(dataset)
    }
}
