//! nr-core: shared types and numeric helpers for the node-graph video renderer
//!
//! This crate provides the foundational pieces used across every other
//! `nr-*` crate: the error taxonomy and small numeric utilities that the
//! parameter engine and node catalog both lean on.

mod error;
mod math;

pub use error::{CoreError, CoreResult};
pub use math::{clamp01, lerp, lerp_range};

/// Frames per second used for the audio feature time-series.
pub const FEATURE_FRAME_RATE: u32 = 30;

/// Analysis window size in samples.
pub const ANALYSIS_BUFFER_SIZE: usize = 2048;

/// Minimum gap between accepted beats, in seconds.
pub const MIN_BEAT_GAP_S: f64 = 0.1;
