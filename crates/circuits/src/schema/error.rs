use thiserror::Error;

/// Errors raised while encoding or decoding records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("string of {len} bytes exceeds the {max} byte limit")]
    StringTooLong { len: usize, max: usize },

    #[error("expected {expected} field elements, got {actual}")]
    FieldCount { expected: usize, actual: usize },

    #[error("field element is not a canonical byte chunk")]
    NonCanonicalChunk,

    #[error("invalid length prefix")]
    InvalidLength,

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}
