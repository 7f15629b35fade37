//! Error type for feature extraction (C2)

use thiserror::Error;

/// Analysis errors.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("empty PCM buffer")]
    EmptyPcm,

    #[error("non-finite feature value in {series} at frame {index}")]
    NonFiniteValue { series: &'static str, index: usize },

    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(u32),
}

/// Result type for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;
