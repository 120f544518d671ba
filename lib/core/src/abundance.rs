//! Sample abundance input
//!
//! Abundances come either as pasted `gene, abundance` lines or as an uploaded table.
//! A value that does not parse as a number is kept as `None` instead of dropping the
//! entry.

use crate::error::{Error, Result};
use crate::record::parse_number;
use crate::table::read_delimited;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One gene of a sample and its abundance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbundanceEntry {
    pub gene: String,
    pub abundance: Option<f64>,
}

impl AbundanceEntry {
    pub fn new(gene: impl Into<String>, abundance: Option<f64>) -> Self {
        Self { gene: gene.into(), abundance }
    }
}

/// Parses pasted text, one `gene, abundance` pair per line
///
/// Lines are split on their first comma; lines without a comma are skipped.
pub fn parse_pasted(text: &str) -> Vec<AbundanceEntry> {
    text.lines()
        .filter_map(|line| line.split_once(','))
        .map(|(gene, abundance)| AbundanceEntry::new(gene.trim(), parse_number(abundance)))
        .collect()
}

/// Parses an uploaded table with a gene column and an abundance column
///
/// Header matching is case-insensitive; `genes` is preferred over `gene`.
pub fn parse_table(text: &str) -> Result<Vec<AbundanceEntry>> {
    let table = read_delimited(text)?;
    let lowered: Vec<String> = table.headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let find = |name: &str| lowered.iter().position(|h| h == name);

    let gene_col = find("genes").or_else(|| find("gene"));
    let abundance_col = find("abundance");
    let (gene_col, abundance_col) = match (gene_col, abundance_col) {
        (Some(g), Some(a)) => (g, a),
        _ => return Err(Error::AbundanceColumns),
    };

    let entries: Vec<AbundanceEntry> = table
        .rows
        .iter()
        .map(|row| AbundanceEntry::new(row[gene_col].clone(), parse_number(&row[abundance_col])))
        .collect();

    debug!(
        "Parsed {} abundance rows ({} unparseable)",
        entries.len(),
        entries.iter().filter(|e| e.abundance.is_none()).count()
    );
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pasted() {
        let entries = parse_pasted("dfra24, 12.5\nmecA,0.8\n\nno comma here\ntetM, lots\nbla, TEM, 3\n");
        assert_eq!(
            entries,
            vec![
                AbundanceEntry::new("dfra24", Some(12.5)),
                AbundanceEntry::new("mecA", Some(0.8)),
                AbundanceEntry::new("tetM", None),
                AbundanceEntry::new("bla", None),
            ]
        );
    }

    #[test]
    fn test_parse_table_case_insensitive_headers() {
        let entries = parse_table("GENE,Sample,ABUNDANCE\nmecA,s1,4\nvanA,s1,x\n").unwrap();
        assert_eq!(
            entries,
            vec![AbundanceEntry::new("mecA", Some(4.0)), AbundanceEntry::new("vanA", None)]
        );
    }

    #[test]
    fn test_parse_table_prefers_genes_column() {
        let entries = parse_table("gene,Genes,Abundance\nx,mecA,1\n").unwrap();
        assert_eq!(entries[0].gene, "mecA");
    }

    #[test]
    fn test_parse_table_missing_columns() {
        assert!(matches!(parse_table("Genes,Count\nmecA,1\n"), Err(Error::AbundanceColumns)));
    }

    #[test]
    fn test_parse_table_tab_delimited() {
        let entries = parse_table("Genes\tAbundance\nmecA\t2.5\n").unwrap();
        assert_eq!(entries, vec![AbundanceEntry::new("mecA", Some(2.5))]);
    }
}
