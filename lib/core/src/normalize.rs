//! Schema normalization
//!
//! Maps raw, possibly misspelled spreadsheet headers onto the canonical attribute
//! vocabulary and keeps the resulting column names unique.

use crate::attribute::Attribute;
use crate::error::{Error, Result};
use ahash::AHashSet;
use serde::Serialize;

/// Sanitizes a single raw header
///
/// Surrounding whitespace is dropped, `-`, `/`, `\` and non-breaking spaces become
/// spaces, and the remaining tokens are joined with underscores.
pub fn sanitize_header(raw: &str) -> String {
    let spaced: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            '\u{a0}' | '-' | '/' | '\\' => ' ',
            other => other,
        })
        .collect();

    spaced.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Normalizes a header row
///
/// Known headers are replaced by their canonical name, unknown ones keep their
/// sanitized spelling. Repeated names get `_2`, `_3`, ... suffixes in first-seen order.
/// Normalizing an already canonical row returns it unchanged.
pub fn normalize<S: AsRef<str>>(raw_headers: &[S]) -> Vec<String> {
    let mut assigned: AHashSet<String> = AHashSet::with_capacity(raw_headers.len());
    let mut names = Vec::with_capacity(raw_headers.len());

    for raw in raw_headers {
        let sanitized = sanitize_header(raw.as_ref());
        let target = match Attribute::from_alias(&sanitized.to_lowercase()) {
            Some(attribute) => attribute.canonical_name().to_string(),
            None => sanitized,
        };

        let name = if assigned.contains(&target) {
            let mut n = 2;
            loop {
                let candidate = format!("{}_{}", target, n);
                if !assigned.contains(&candidate) {
                    break candidate;
                }
                n += 1;
            }
        } else {
            target
        };

        assigned.insert(name.clone());
        names.push(name);
    }

    // A second copy of a score header usually holds the derived value column
    for score in Attribute::SCORES {
        if let Some(value) = score.value_variant() {
            let value_name = value.canonical_name();
            let has_base = names.iter().any(|n| n == score.canonical_name());
            if !has_base || names.iter().any(|n| n == value_name) {
                continue;
            }
            let duplicate = format!("{}_2", score.canonical_name());
            if let Some(slot) = names.iter_mut().find(|n| **n == duplicate) {
                *slot = value_name.to_string();
            }
        }
    }

    names
}

/// A normalized column and the canonical attribute it carries, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub attribute: Option<Attribute>,
}

/// Normalized header row with its attribute mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSchema {
    pub columns: Vec<Column>,
}

impl ResolvedSchema {
    /// Normalizes `raw_headers` and requires a gene-name column
    pub fn resolve<S: AsRef<str>>(raw_headers: &[S]) -> Result<Self> {
        let columns: Vec<Column> = normalize(raw_headers)
            .into_iter()
            .map(|name| {
                let attribute = Attribute::from_canonical(&name);
                Column { name, attribute }
            })
            .collect();

        let schema = Self { columns };
        if schema.position(Attribute::Genes).is_none() {
            return Err(Error::Schema {
                missing: Attribute::Genes.canonical_name().to_string(),
            });
        }
        Ok(schema)
    }

    /// Index of the first column carrying `attribute`
    pub fn position(&self, attribute: Attribute) -> Option<usize> {
        self.columns.iter().position(|c| c.attribute == Some(attribute))
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}
