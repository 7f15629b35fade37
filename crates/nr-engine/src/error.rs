use thiserror::Error;

use nr_dispatch::WorkerError;
use nr_encode::EncodeError;
use nr_features::AnalysisError;
use nr_render::RenderError;
use nr_timeline::TimelineError;

/// Top-level error returned by `render()`. Every stage's error wraps in
/// unchanged, so callers can match on the failing stage without re-parsing
/// a string.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0} is required but was not provided")]
    MissingInput(&'static str),
    #[error("audio decode failed: {0}")]
    Decode(#[from] nr_audio::DecodeError),
    #[error("feature analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("timeline invalid: {0}")]
    Timeline(#[from] TimelineError),
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error("render worker failed: {0}")]
    Worker(#[from] WorkerError),
    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Exit code for the CLI binary, per the documented `1`..`4` mapping:
    /// bad arguments, decode/analysis, render, encode.
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::MissingInput(_) => 1,
            EngineError::Decode(_) | EngineError::Analysis(_) | EngineError::Timeline(_) => 2,
            EngineError::Render(_) | EngineError::Worker(_) => 3,
            EngineError::Encode(_) => 4,
            EngineError::Io(_) => 1,
        }
    }
}
