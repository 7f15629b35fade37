//! Shared error type for small cross-cutting failures.
//!
//! Stage-specific crates (`nr-audio`, `nr-features`, `nr-render`, ...)
//! define their own error enums; this one exists for the
//! handful of helpers that live in `nr-core` itself.

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid numeric input: {0}")]
    InvalidNumber(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type CoreResult<T> = Result<T, CoreError>;
