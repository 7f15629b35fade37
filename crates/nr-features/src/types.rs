//! The `AudioFeatures` data model.

use serde::{Deserialize, Serialize};

/// One detected beat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    pub time_s: f64,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
}

/// Per-frame scalar time-series, one value per analysis frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScalarSeries {
    pub rms: Vec<f32>,
    pub zcr: Vec<f32>,
    pub spectral_centroid: Vec<f32>,
    pub spectral_rolloff: Vec<f32>,
    pub spectral_flux: Vec<f32>,
    pub bass: Vec<f32>,
    pub low_mid: Vec<f32>,
    pub mid: Vec<f32>,
    pub high_mid: Vec<f32>,
    pub high: Vec<f32>,
    pub loudness: Vec<f32>,
    pub energy: Vec<f32>,
}

/// The full dense time-series produced once by the feature extractor and
/// read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub duration_s: f64,
    pub sample_rate: u32,
    pub tempo_bpm: f64,
    pub frame_rate: u32,
    pub series: ScalarSeries,
    /// 13-coefficient MFCC per frame.
    pub mfcc: Vec<[f32; 13]>,
    /// 12-bin chroma (pitch class) per frame.
    pub chroma: Vec<[f32; 12]>,
    pub beats: Vec<Beat>,
}

impl AudioFeatures {
    /// Number of analysis frames, `N = floor(duration_s * frame_rate)`.
    pub fn frame_count(&self) -> usize {
        self.series.rms.len()
    }

    /// Clamp a continuous time to a valid frame index.
    pub fn time_to_frame_index(&self, time_s: f64) -> usize {
        let n = self.frame_count();
        if n == 0 {
            return 0;
        }
        let idx = (time_s * self.frame_rate as f64).round() as i64;
        idx.clamp(0, n as i64 - 1) as usize
    }

    /// Look up a beat within `±100ms` of `time_s` with at least
    /// `min_confidence`, returning its confidence or `0.0` if none qualifies.
    pub fn beat_near(&self, time_s: f64, min_confidence: f32) -> f32 {
        for beat in &self.beats {
            if (beat.time_s - time_s).abs() < 0.1 && beat.confidence >= min_confidence {
                return beat.confidence;
            }
        }
        0.0
    }
}
