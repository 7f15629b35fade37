//! Top-level feature extraction orchestration.

use nr_core::{ANALYSIS_BUFFER_SIZE, FEATURE_FRAME_RATE};

use crate::beats::{detect_beats, estimate_tempo};
use crate::error::{AnalysisError, AnalysisResult};
use crate::spectral::SpectralAnalyzer;
use crate::types::{AudioFeatures, ScalarSeries};

/// Extract `AudioFeatures` from mono PCM at `sample_rate` Hz.
pub fn extract(samples: &[f32], sample_rate: u32, duration_s: f64) -> AnalysisResult<AudioFeatures> {
    if samples.is_empty() {
        return Err(AnalysisError::EmptyPcm);
    }
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidSampleRate(sample_rate));
    }

    let hop = (sample_rate as usize) / FEATURE_FRAME_RATE as usize;
    let hop = hop.max(1);
    let n = samples.len() / hop;

    let mut series = ScalarSeries::default();
    let mut mfcc = Vec::with_capacity(n);
    let mut chroma = Vec::with_capacity(n);

    let mut analyzer = SpectralAnalyzer::new(sample_rate as f32);
    let mut prev_energy = 0.0f32;

    for i in 0..n {
        let start = i * hop;
        let mut window = vec![0.0f32; ANALYSIS_BUFFER_SIZE];
        let available = samples.len().saturating_sub(start).min(ANALYSIS_BUFFER_SIZE);
        window[..available].copy_from_slice(&samples[start..start + available]);

        let rms = (window.iter().map(|x| x * x).sum::<f32>() / window.len() as f32).sqrt();
        let zcr = zero_crossing_rate(&window);
        let loudness: f32 = window.iter().map(|x| x.abs()).sum();
        let energy: f32 = window.iter().map(|x| x * x).sum();
        let flux = if i == 0 { 0.0 } else { (energy - prev_energy).abs() };
        prev_energy = energy;

        for (label, v) in [
            ("rms", rms),
            ("zcr", zcr),
            ("loudness", loudness),
            ("energy", energy),
        ] {
            if !v.is_finite() {
                return Err(AnalysisError::NonFiniteValue { series: label, index: i });
            }
        }

        let spectrum = analyzer.analyze(&window);

        series.rms.push(rms);
        series.zcr.push(zcr);
        series.loudness.push(loudness);
        series.energy.push(energy);
        series.spectral_flux.push(flux);
        series.spectral_centroid.push(spectrum.centroid);
        series.spectral_rolloff.push(spectrum.rolloff);
        series.bass.push(spectrum.bands[0]);
        series.low_mid.push(spectrum.bands[1]);
        series.mid.push(spectrum.bands[2]);
        series.high_mid.push(spectrum.bands[3]);
        series.high.push(spectrum.bands[4]);
        mfcc.push(spectrum.mfcc);
        chroma.push(spectrum.chroma);
    }

    let beats = detect_beats(&series.spectral_flux);
    let tempo_bpm = estimate_tempo(&beats);

    log::info!(
        "extracted {} frames, {} beats, tempo {:.0} bpm",
        n,
        beats.len(),
        tempo_bpm
    );

    Ok(AudioFeatures {
        duration_s,
        sample_rate,
        tempo_bpm,
        frame_rate: FEATURE_FRAME_RATE,
        series,
        mfcc,
        chroma,
        beats,
    })
}

fn zero_crossing_rate(buffer: &[f32]) -> f32 {
    if buffer.len() < 2 {
        return 0.0;
    }
    let crossings = buffer
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f32 / buffer.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, duration_s: f64) -> Vec<f32> {
        let n = (sample_rate as f64 * duration_s) as usize;
        (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn empty_pcm_is_rejected() {
        assert!(matches!(extract(&[], 48_000, 1.0), Err(AnalysisError::EmptyPcm)));
    }

    #[test]
    fn frame_count_matches_invariant() {
        let sr = 48_000;
        let duration_s = 2.0;
        let samples = sine(440.0, sr, duration_s);
        let features = extract(&samples, sr, duration_s).unwrap();
        assert_eq!(features.frame_count(), 60);
        assert_eq!(features.series.zcr.len(), 60);
        assert_eq!(features.mfcc.len(), 60);
        assert_eq!(features.chroma.len(), 60);
    }

    #[test]
    fn silent_sine_has_no_beats_and_fallback_tempo() {
        let sr = 48_000;
        let samples = sine(440.0, sr, 2.0);
        let features = extract(&samples, sr, 2.0).unwrap();
        assert!(features.beats.is_empty());
        assert_eq!(features.tempo_bpm, 120.0);
    }

    #[test]
    fn click_track_produces_regular_beats() {
        let sr = 48_000u32;
        let duration_s = 4.0;
        let mut samples = vec![0.0f32; (sr as f64 * duration_s) as usize];
        let mut t = 0.0;
        while t < duration_s {
            let idx = (t * sr as f64) as usize;
            if idx < samples.len() {
                samples[idx] = 1.0;
            }
            t += 0.5;
        }
        let features = extract(&samples, sr, duration_s).unwrap();
        assert!(features.beats.len() >= 5, "found {} beats", features.beats.len());
        for w in features.beats.windows(2) {
            assert!(w[1].time_s - w[0].time_s >= 0.1 - 1e-9);
        }
    }
}
