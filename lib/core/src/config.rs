//! Runtime settings
//!
//! Defaults match the interactive portal: fuzzy matching on, cutoff 70, five similar
//! matches, risk index over `Final_Risk_score` without clamping.

use crate::error::{Error, Result};
use crate::risk::ClampPolicy;
use argrisk_similarity::MatchMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_DATASET_PATH: &str = "genes_risk.csv";
pub const DEFAULT_CUTOFF: u8 = 70;
pub const MIN_CUTOFF: u8 = 50;
pub const MAX_CUTOFF: u8 = 95;
pub const DEFAULT_SIMILAR_LIMIT: usize = 5;
pub const DEFAULT_SCORE_COLUMN: &str = "Final_Risk_score";

/// Matcher parameters shared by lookup, bulk resolve and risk index
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MatchSettings {
    #[serde(default = "default_fuzzy")]
    pub fuzzy: bool,
    #[serde(default = "default_cutoff")]
    pub cutoff: u8,
    /// Number of similar matches reported by a single lookup
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_fuzzy() -> bool {
    true
}

fn default_cutoff() -> u8 {
    DEFAULT_CUTOFF
}

fn default_limit() -> usize {
    DEFAULT_SIMILAR_LIMIT
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            fuzzy: true,
            cutoff: DEFAULT_CUTOFF,
            limit: DEFAULT_SIMILAR_LIMIT,
        }
    }
}

impl MatchSettings {
    pub fn exact() -> Self {
        Self { fuzzy: false, ..Self::default() }
    }

    pub fn fuzzy(cutoff: u8) -> Self {
        Self { fuzzy: true, cutoff, ..Self::default() }
    }

    pub fn mode(&self) -> MatchMode {
        MatchMode::from_fuzzy_flag(self.fuzzy)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_CUTOFF..=MAX_CUTOFF).contains(&self.cutoff) {
            return Err(Error::InvalidConfig(format!(
                "fuzzy cutoff {} outside {}..={}",
                self.cutoff, MIN_CUTOFF, MAX_CUTOFF
            )));
        }
        if self.limit == 0 {
            return Err(Error::InvalidConfig("similar-match limit must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Risk index parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskSettings {
    #[serde(default = "default_score_column")]
    pub score_attribute: String,
    #[serde(default)]
    pub clamp: ClampPolicy,
}

fn default_score_column() -> String {
    DEFAULT_SCORE_COLUMN.to_string()
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            score_attribute: default_score_column(),
            clamp: ClampPolicy::default(),
        }
    }
}

/// All settings, loadable from a JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub dataset: Option<String>,
    #[serde(default, rename = "match")]
    pub matching: MatchSettings,
    #[serde(default)]
    pub risk: RiskSettings,
}

impl Settings {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let settings: Settings =
            serde_json::from_str(text).map_err(|e| Error::Serialization(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.matching.validate()
    }

    pub fn dataset_path(&self) -> &str {
        self.dataset.as_deref().unwrap_or(DEFAULT_DATASET_PATH)
    }
}
