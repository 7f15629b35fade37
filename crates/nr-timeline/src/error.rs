use thiserror::Error;

/// Errors raised while parsing or validating a `VisualTimeline`.
#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("timeline duration must be > 0, got {0}")]
    NonPositiveDuration(f64),
    #[error("invalid node: {0}")]
    InvalidNode(String),
    #[error("malformed timeline JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type TimelineResult<T> = Result<T, TimelineError>;
