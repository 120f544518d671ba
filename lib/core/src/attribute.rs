//! Canonical attribute vocabulary
//!
//! Every reference column is normalized toward one of these names. The alias table maps
//! lower-cased, underscore-joined header text (including the misspellings found in
//! circulating spreadsheets) to its canonical attribute.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A recognized risk-dimension column
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Attribute {
    Genes,
    ClinicalImportanceLevel,
    TransmissibilityLevel,
    MobilityLevel,
    PathogenicLevel,
    ClinicalImportanceScore,
    TransmissibilityScore,
    MobilityScore,
    PathogenicScore,
    FinalRiskScore,
    /// Derived value stored next to the raw final risk score
    FinalRiskValue,
}

impl Attribute {
    /// Categorical level columns, in display order
    pub const LEVELS: [Attribute; 4] = [
        Attribute::ClinicalImportanceLevel,
        Attribute::TransmissibilityLevel,
        Attribute::MobilityLevel,
        Attribute::PathogenicLevel,
    ];

    /// Numeric score columns, in display order
    pub const SCORES: [Attribute; 6] = [
        Attribute::ClinicalImportanceScore,
        Attribute::TransmissibilityScore,
        Attribute::MobilityScore,
        Attribute::PathogenicScore,
        Attribute::FinalRiskScore,
        Attribute::FinalRiskValue,
    ];

    /// Score columns in the order offered for risk-index computation
    pub const RISK_CHOICES: [Attribute; 5] = [
        Attribute::FinalRiskScore,
        Attribute::PathogenicScore,
        Attribute::MobilityScore,
        Attribute::ClinicalImportanceScore,
        Attribute::TransmissibilityScore,
    ];

    pub fn canonical_name(self) -> &'static str {
        match self {
            Attribute::Genes => "Genes",
            Attribute::ClinicalImportanceLevel => "Clinical_Importance_level",
            Attribute::TransmissibilityLevel => "Transmissibility_level",
            Attribute::MobilityLevel => "Mobility_level",
            Attribute::PathogenicLevel => "Pathogenic_level",
            Attribute::ClinicalImportanceScore => "Clinical_Importance_score",
            Attribute::TransmissibilityScore => "Transmissibility_score",
            Attribute::MobilityScore => "Mobility_score",
            Attribute::PathogenicScore => "Pathogenic_score",
            Attribute::FinalRiskScore => "Final_Risk_score",
            Attribute::FinalRiskValue => "Final_Risk_value",
        }
    }

    /// Look up an attribute by its exact canonical name
    pub fn from_canonical(name: &str) -> Option<Self> {
        std::iter::once(Attribute::Genes)
            .chain(Self::LEVELS)
            .chain(Self::SCORES)
            .find(|a| a.canonical_name() == name)
    }

    /// Look up an attribute by lower-cased, underscore-joined header text
    pub fn from_alias(lowered: &str) -> Option<Self> {
        COLUMN_ALIASES
            .iter()
            .find(|(alias, _)| *alias == lowered)
            .map(|(_, attribute)| *attribute)
    }

    pub fn is_level(self) -> bool {
        Self::LEVELS.contains(&self)
    }

    pub fn is_score(self) -> bool {
        Self::SCORES.contains(&self)
    }

    /// The derived "value" column paired with this score, if any
    pub fn value_variant(self) -> Option<Attribute> {
        match self {
            Attribute::FinalRiskScore => Some(Attribute::FinalRiskValue),
            _ => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Lower-cased header text -> canonical attribute
pub const COLUMN_ALIASES: &[(&str, Attribute)] = &[
    ("genes", Attribute::Genes),
    ("gene", Attribute::Genes),
    ("gene_name", Attribute::Genes),
    ("gene_names", Attribute::Genes),
    ("gene_symbol", Attribute::Genes),
    ("arg", Attribute::Genes),
    ("clinical_importance_level", Attribute::ClinicalImportanceLevel),
    ("clinial_importance_level", Attribute::ClinicalImportanceLevel),
    ("clinical_importance", Attribute::ClinicalImportanceLevel),
    ("transmissibility_level", Attribute::TransmissibilityLevel),
    ("transmissbilitty_level", Attribute::TransmissibilityLevel),
    ("transmissibility", Attribute::TransmissibilityLevel),
    ("mobility_level", Attribute::MobilityLevel),
    ("mobility", Attribute::MobilityLevel),
    ("pathogenic_level", Attribute::PathogenicLevel),
    ("pathogenicity_level", Attribute::PathogenicLevel),
    ("pathogenicity", Attribute::PathogenicLevel),
    ("clinical_importance_score", Attribute::ClinicalImportanceScore),
    ("clinial_importance_score", Attribute::ClinicalImportanceScore),
    ("transmissibility_score", Attribute::TransmissibilityScore),
    ("transmissbilitty_score", Attribute::TransmissibilityScore),
    ("transmissibilty_score", Attribute::TransmissibilityScore),
    ("mobility_score", Attribute::MobilityScore),
    ("pathogenic_score", Attribute::PathogenicScore),
    ("pathogenicity_score", Attribute::PathogenicScore),
    ("final_risk_score", Attribute::FinalRiskScore),
    ("final_score", Attribute::FinalRiskScore),
    ("risk_score", Attribute::FinalRiskScore),
    ("final_risk_value", Attribute::FinalRiskValue),
    ("risk_value", Attribute::FinalRiskValue),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_canonical_name_is_its_own_alias() {
        for attribute in std::iter::once(Attribute::Genes)
            .chain(Attribute::LEVELS)
            .chain(Attribute::SCORES)
        {
            let lowered = attribute.canonical_name().to_lowercase();
            assert_eq!(Attribute::from_alias(&lowered), Some(attribute));
            assert_eq!(Attribute::from_canonical(attribute.canonical_name()), Some(attribute));
        }
    }

    #[test]
    fn test_misspelled_aliases() {
        assert_eq!(
            Attribute::from_alias("clinial_importance_score"),
            Some(Attribute::ClinicalImportanceScore)
        );
        assert_eq!(
            Attribute::from_alias("transmissbilitty_score"),
            Some(Attribute::TransmissibilityScore)
        );
        assert_eq!(Attribute::from_alias("unknown_column"), None);
    }

    #[test]
    fn test_aliases_are_lowercase() {
        for (alias, _) in COLUMN_ALIASES {
            assert_eq!(*alias, alias.to_lowercase());
        }
    }

    #[test]
    fn test_value_variant() {
        assert_eq!(Attribute::FinalRiskScore.value_variant(), Some(Attribute::FinalRiskValue));
        assert_eq!(Attribute::MobilityScore.value_variant(), None);
    }
}
