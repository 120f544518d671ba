//! Typed reference rows
//!
//! A [`GeneRecord`] has one optional field per canonical attribute (`None` when the
//! dataset has no such column) plus a side map for pass-through columns.

use crate::attribute::Attribute;
use ahash::AHashMap;
use serde::Serialize;

/// Display sentinel for a missing cell
pub const UNKNOWN: &str = "Unknown";

/// One row of the reference dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneRecord {
    /// Display name as written in the source
    pub genes: String,
    /// Trimmed, lower-cased `genes`
    pub gene_key: String,
    pub clinical_importance_level: Option<String>,
    pub transmissibility_level: Option<String>,
    pub mobility_level: Option<String>,
    pub pathogenic_level: Option<String>,
    pub clinical_importance_score: Option<String>,
    pub transmissibility_score: Option<String>,
    pub mobility_score: Option<String>,
    pub pathogenic_score: Option<String>,
    pub final_risk_score: Option<String>,
    pub final_risk_value: Option<String>,
    /// Columns outside the canonical vocabulary, keyed by normalized header
    pub extra: AHashMap<String, String>,
}

/// Builds the lookup key for a gene name
pub fn gene_key(genes: &str) -> String {
    genes.trim().to_lowercase()
}

/// Parses a numeric cell, `None` for anything that is not a number
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Converts a score to a 0-100 percentage
///
/// Negative values clamp to 0, values up to 1.0 are read as fractions, values above 100
/// clamp to 100.
pub fn to_percent(raw: &str) -> Option<f64> {
    let v = parse_number(raw)?.max(0.0);
    Some(if v <= 1.0 { v * 100.0 } else { v.min(100.0) })
}

impl GeneRecord {
    /// A record with only a gene name set
    pub fn new(genes: impl Into<String>) -> Self {
        let genes = genes.into();
        Self {
            gene_key: gene_key(&genes),
            genes,
            clinical_importance_level: None,
            transmissibility_level: None,
            mobility_level: None,
            pathogenic_level: None,
            clinical_importance_score: None,
            transmissibility_score: None,
            mobility_score: None,
            pathogenic_score: None,
            final_risk_score: None,
            final_risk_value: None,
            extra: AHashMap::new(),
        }
    }

    /// Value of a canonical attribute
    pub fn get(&self, attribute: Attribute) -> Option<&str> {
        let slot = match attribute {
            Attribute::Genes => return Some(&self.genes),
            Attribute::ClinicalImportanceLevel => &self.clinical_importance_level,
            Attribute::TransmissibilityLevel => &self.transmissibility_level,
            Attribute::MobilityLevel => &self.mobility_level,
            Attribute::PathogenicLevel => &self.pathogenic_level,
            Attribute::ClinicalImportanceScore => &self.clinical_importance_score,
            Attribute::TransmissibilityScore => &self.transmissibility_score,
            Attribute::MobilityScore => &self.mobility_score,
            Attribute::PathogenicScore => &self.pathogenic_score,
            Attribute::FinalRiskScore => &self.final_risk_score,
            Attribute::FinalRiskValue => &self.final_risk_value,
        };
        slot.as_deref()
    }

    /// Sets a canonical attribute; setting `Genes` also refreshes the key
    pub fn set(&mut self, attribute: Attribute, value: String) {
        let slot = match attribute {
            Attribute::Genes => {
                self.gene_key = gene_key(&value);
                self.genes = value;
                return;
            }
            Attribute::ClinicalImportanceLevel => &mut self.clinical_importance_level,
            Attribute::TransmissibilityLevel => &mut self.transmissibility_level,
            Attribute::MobilityLevel => &mut self.mobility_level,
            Attribute::PathogenicLevel => &mut self.pathogenic_level,
            Attribute::ClinicalImportanceScore => &mut self.clinical_importance_score,
            Attribute::TransmissibilityScore => &mut self.transmissibility_score,
            Attribute::MobilityScore => &mut self.mobility_score,
            Attribute::PathogenicScore => &mut self.pathogenic_score,
            Attribute::FinalRiskScore => &mut self.final_risk_score,
            Attribute::FinalRiskValue => &mut self.final_risk_value,
        };
        *slot = Some(value);
    }

    /// Value of a column by normalized name, canonical or pass-through
    pub fn value(&self, column: &str) -> Option<&str> {
        match Attribute::from_canonical(column) {
            Some(attribute) => self.get(attribute),
            None => self.extra.get(column).map(|s| s.as_str()),
        }
    }

    /// Numeric value of a column, `None` when absent or unparseable
    pub fn number(&self, column: &str) -> Option<f64> {
        self.value(column).and_then(parse_number)
    }

    /// Final risk score as a 0-100 percentage
    pub fn risk_percent(&self) -> Option<f64> {
        self.final_risk_score.as_deref().and_then(to_percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gene_key() {
        assert_eq!(gene_key("  blaTEM-1 "), "blatem-1");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 2.5 "), Some(2.5));
        assert_eq!(parse_number("Not Defined"), None);
        assert_eq!(parse_number(UNKNOWN), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_to_percent() {
        assert_eq!(to_percent("0.5"), Some(50.0));
        assert_eq!(to_percent("1"), Some(100.0));
        assert_eq!(to_percent("42"), Some(42.0));
        assert_eq!(to_percent("250"), Some(100.0));
        assert_eq!(to_percent("-3"), Some(0.0));
        assert_eq!(to_percent("high"), None);
    }

    #[test]
    fn test_get_set_roundtrip() {
        let mut record = GeneRecord::new("mecA");
        record.set(Attribute::PathogenicScore, "3".to_string());
        record.set(Attribute::MobilityLevel, "High".to_string());
        record.extra.insert("Notes".to_string(), "plasmid".to_string());

        assert_eq!(record.get(Attribute::Genes), Some("mecA"));
        assert_eq!(record.get(Attribute::PathogenicScore), Some("3"));
        assert_eq!(record.value("Mobility_level"), Some("High"));
        assert_eq!(record.value("Notes"), Some("plasmid"));
        assert_eq!(record.value("Missing"), None);
        assert_eq!(record.number("Pathogenic_score"), Some(3.0));
        assert_eq!(record.number("Mobility_level"), None);
    }

    #[test]
    fn test_set_genes_refreshes_key() {
        let mut record = GeneRecord::new("x");
        record.set(Attribute::Genes, " VanA ".to_string());
        assert_eq!(record.gene_key, "vana");
    }

    #[test]
    fn test_risk_percent() {
        let mut record = GeneRecord::new("mecA");
        assert_eq!(record.risk_percent(), None);
        record.set(Attribute::FinalRiskScore, "0.8".to_string());
        assert!((record.risk_percent().unwrap() - 80.0).abs() < 1e-9);
    }
}
