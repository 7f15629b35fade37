//! Beat detection and tempo estimation.

use nr_core::{FEATURE_FRAME_RATE, MIN_BEAT_GAP_S};

use crate::types::Beat;

const FLUX_THRESHOLD: f32 = 0.1;

/// Peak-pick `flux` for local maxima above `FLUX_THRESHOLD`, at least
/// `MIN_BEAT_GAP_S` after the previous accepted beat.
pub fn detect_beats(flux: &[f32]) -> Vec<Beat> {
    let mut beats = Vec::new();
    let mut last_time: Option<f64> = None;

    for i in 1..flux.len().saturating_sub(1) {
        let v = flux[i];
        if v <= FLUX_THRESHOLD || v <= flux[i - 1] || v <= flux[i + 1] {
            continue;
        }
        let time_s = i as f64 / FEATURE_FRAME_RATE as f64;
        if let Some(last) = last_time {
            if time_s - last < MIN_BEAT_GAP_S {
                continue;
            }
        }
        beats.push(Beat {
            time_s,
            confidence: v.min(1.0),
        });
        last_time = Some(time_s);
    }

    beats
}

/// Median inter-beat interval → BPM, folded into `[60, 200]`, with a
/// fallback of 120 BPM for fewer than two beats.
pub fn estimate_tempo(beats: &[Beat]) -> f64 {
    if beats.len() < 2 {
        return 120.0;
    }

    let mut intervals: Vec<f64> = beats.windows(2).map(|w| w[1].time_s - w[0].time_s).collect();
    intervals.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let median = if intervals.len() % 2 == 1 {
        intervals[intervals.len() / 2]
    } else {
        let mid = intervals.len() / 2;
        (intervals[mid - 1] + intervals[mid]) / 2.0
    };

    if median <= 0.0 {
        return 120.0;
    }

    let mut bpm = 60.0 / median;
    if bpm < 60.0 {
        bpm *= 2.0;
    }
    if bpm > 200.0 {
        bpm /= 2.0;
    }
    bpm.round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_peaks_yields_no_beats() {
        let flux = vec![0.0; 100];
        assert!(detect_beats(&flux).is_empty());
    }

    #[test]
    fn single_isolated_peak_is_detected() {
        let mut flux = vec![0.0; 90];
        flux[45] = 0.5;
        let beats = detect_beats(&flux);
        assert_eq!(beats.len(), 1);
        assert!((beats[0].time_s - 1.5).abs() < 1e-9);
        assert_eq!(beats[0].confidence, 0.5);
    }

    #[test]
    fn peaks_closer_than_min_gap_are_merged_to_first() {
        // at 30Hz frame rate, 2 frames = 66ms < 100ms gap
        let mut flux = vec![0.0; 90];
        flux[10] = 0.5;
        flux[12] = 0.6;
        let beats = detect_beats(&flux);
        assert_eq!(beats.len(), 1);
    }

    #[test]
    fn tempo_fallback_with_few_beats() {
        assert_eq!(estimate_tempo(&[]), 120.0);
        assert_eq!(
            estimate_tempo(&[Beat {
                time_s: 1.0,
                confidence: 1.0
            }]),
            120.0
        );
    }

    #[test]
    fn tempo_folds_into_range() {
        // 0.5s interval => 120 bpm exactly
        let beats: Vec<Beat> = (0..8)
            .map(|i| Beat {
                time_s: i as f64 * 0.5,
                confidence: 1.0,
            })
            .collect();
        assert_eq!(estimate_tempo(&beats), 120.0);
    }
}
