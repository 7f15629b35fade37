//! nr-features: Feature Extractor (C2)
//!
//! Produces the dense 30 Hz `AudioFeatures` time-series: RMS, ZCR, spectral centroid/rolloff/flux, five frequency
//! bands, MFCC, chroma, loudness, energy, beats, and tempo.

mod beats;
mod error;
mod extractor;
mod spectral;
mod types;

pub use error::{AnalysisError, AnalysisResult};
pub use extractor::extract;
pub use types::{AudioFeatures, Beat, ScalarSeries};
