use thiserror::Error;

/// Errors raised by tree and slot path operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SmtError {
    #[error("slot index {index} does not fit a tree of height {height}")]
    IndexOutOfRange { index: u64, height: usize },
    #[error("slot path has height {actual}, expected {expected}")]
    HeightMismatch { expected: usize, actual: usize },
    #[error("slot path has {siblings} siblings but {directions} directions")]
    MalformedPath { siblings: usize, directions: usize },
    #[error("invalid slot path encoding: {0}")]
    Encoding(String),
}
