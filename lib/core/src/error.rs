use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema error: required column '{missing}' not found after header normalization")]
    Schema { missing: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Column not found: {0}")]
    Column(String),

    #[error("Abundance table must contain 'Genes' (or 'Gene') and 'Abundance' columns")]
    AbundanceColumns,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
