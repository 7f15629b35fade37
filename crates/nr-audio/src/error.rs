//! Error type for audio decode (C1)

use thiserror::Error;

/// Decode errors.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("probe subprocess failed: {0}")]
    ProbeFailed(String),

    #[error("decode subprocess failed: {0}")]
    DecodeFailed(String),

    #[error("malformed probe output: {0}")]
    MalformedProbe(String),

    #[error("decoded PCM byte count ({0}) is not a multiple of 4")]
    MisalignedPcm(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for decode operations
pub type DecodeResult<T> = Result<T, DecodeError>;
