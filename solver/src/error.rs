//! Error type shared by the engine, the file reader and the application layer.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrossprobError {
    #[error("boundary is empty: n must be at least 1")]
    EmptyBoundary,

    #[error("boundary length mismatch: lower has {lower} entries, upper has {upper}")]
    LengthMismatch { lower: usize, upper: usize },

    #[error("{side}[{index}] = {value} is not finite")]
    NonFinite {
        side: &'static str,
        index: usize,
        value: f64,
    },

    #[error("{side}[{index}] = {value} lies outside [0, 1]")]
    OutOfRange {
        side: &'static str,
        index: usize,
        value: f64,
    },

    #[error("Poisson rate must be finite and non-negative, got {0}")]
    InvalidRate(f64),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CrossprobError {
    /// True for errors caused by the caller's boundary or parameters, as
    /// opposed to I/O failures.
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, CrossprobError::Io { .. } | CrossprobError::Json(_))
    }
}

pub type Result<T> = std::result::Result<T, CrossprobError>;
