//! Typed precondition failures raised by the analyzers.
//!
//! Everything else (I/O, malformed CSV, unexpected categorical values) is
//! propagated as-is through `anyhow`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("List must contain nine numbers.")]
    InvalidLength { expected: usize, found: usize },
    #[error("table '{0}' has no rows")]
    EmptyTable(&'static str),
    #[error("column '{0}' has no values")]
    EmptyColumn(&'static str),
    #[error("degenerate input: {0}")]
    Degenerate(String),
    #[error("{thresholds} thresholds given for {columns} columns")]
    ThresholdMismatch { columns: usize, thresholds: usize },
    #[error("no writable output name found after {0} attempts")]
    SuffixExhausted(usize),
}
