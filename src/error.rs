use std::fmt;
use thiserror::Error;

/// Why a genotype may not be used as a stock, parent or target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inadmissibility {
    Lethal,
    HomozygousBalancer,
}

impl fmt::Display for Inadmissibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inadmissibility::Lethal => {
                write!(f, "lethal (same lethality marker on both alleles of a chromosome)")
            }
            Inadmissibility::HomozygousBalancer => {
                write!(f, "homozygous for a balancer (same balancer on both alleles)")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum CrossError {
    #[error("Malformed genotype entry `{entry}`: {reason}")]
    Format { entry: String, reason: String },

    #[error("Unknown chromosome `{0}`")]
    UnknownChromosome(String),

    #[error("Parents must have the same chromosome set (female: {female}; male: {male})")]
    ChromosomeMismatch { female: String, male: String },

    #[error("Invalid {context}: `{genotype}` is {reason}")]
    Inadmissible {
        context: String,
        genotype: String,
        reason: Inadmissibility,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Stock `{name}` not found (available: {available})")]
    StockNotFound { name: String, available: String },

    #[error("Duplicate stock name `{0}`")]
    DuplicateStock(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl CrossError {
    pub(crate) fn format(entry: &str, reason: impl Into<String>) -> Self {
        CrossError::Format {
            entry: entry.to_owned(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CrossError>;
