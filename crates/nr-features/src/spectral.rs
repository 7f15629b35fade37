//! FFT-based spectral analysis: magnitude spectrum, centroid/rolloff,
//! frequency bands, MFCC and chroma.

use std::sync::Arc;

use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;

use nr_core::ANALYSIS_BUFFER_SIZE;

/// Frequency band boundaries in Hz.
pub const BANDS: [(f32, f32); 5] = [
    (0.0, 250.0),
    (250.0, 500.0),
    (500.0, 2000.0),
    (2000.0, 4000.0),
    (4000.0, f32::INFINITY),
];

/// Reusable analysis window: Hann-windowed forward real FFT plus the scratch
/// buffers it needs. One instance is shared across all frames of one file.
pub struct SpectralAnalyzer {
    fft: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    scratch_in: Vec<f32>,
    scratch_out: Vec<Complex<f32>>,
    mel_filterbank: Vec<Vec<f32>>,
    sample_rate: f32,
}

/// One frame's worth of derived spectral features.
pub struct FrameSpectrum {
    pub magnitudes: Vec<f32>,
    pub centroid: f32,
    pub rolloff: f32,
    pub bands: [f32; 5],
    pub mfcc: [f32; 13],
    pub chroma: [f32; 12],
}

impl SpectralAnalyzer {
    pub fn new(sample_rate: f32) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(ANALYSIS_BUFFER_SIZE);

        let window: Vec<f32> = (0..ANALYSIS_BUFFER_SIZE)
            .map(|i| {
                0.5 - 0.5
                    * (2.0 * std::f32::consts::PI * i as f32
                        / (ANALYSIS_BUFFER_SIZE - 1) as f32)
                        .cos()
            })
            .collect();

        let bin_count = ANALYSIS_BUFFER_SIZE / 2 + 1;
        let mel_filterbank = build_mel_filterbank(26, bin_count, sample_rate);

        Self {
            fft,
            window,
            scratch_in: vec![0.0; ANALYSIS_BUFFER_SIZE],
            scratch_out: vec![Complex::new(0.0, 0.0); bin_count],
            mel_filterbank,
            sample_rate,
        }
    }

    /// Analyze one zero-padded 2048-sample window.
    pub fn analyze(&mut self, buffer: &[f32]) -> FrameSpectrum {
        debug_assert_eq!(buffer.len(), ANALYSIS_BUFFER_SIZE);

        for (i, (&x, &w)) in buffer.iter().zip(&self.window).enumerate() {
            self.scratch_in[i] = x * w;
        }

        if self
            .fft
            .process(&mut self.scratch_in, &mut self.scratch_out)
            .is_err()
        {
            self.scratch_out.iter_mut().for_each(|c| *c = Complex::new(0.0, 0.0));
        }

        let magnitudes: Vec<f32> = self
            .scratch_out
            .iter()
            .map(|c| (c.re * c.re + c.im * c.im).sqrt())
            .collect();

        let bin_hz = self.sample_rate / ANALYSIS_BUFFER_SIZE as f32;

        let centroid = spectral_centroid(&magnitudes, bin_hz);
        let rolloff = spectral_rolloff(&magnitudes, bin_hz, 0.85);
        let bands = band_energies(&magnitudes, bin_hz);
        let mfcc = mfcc13(&magnitudes, &self.mel_filterbank);
        let chroma = chroma12(&magnitudes, bin_hz);

        FrameSpectrum {
            magnitudes,
            centroid,
            rolloff,
            bands,
            mfcc,
            chroma,
        }
    }
}

/// Weighted average frequency of the magnitude spectrum.
fn spectral_centroid(magnitudes: &[f32], bin_hz: f32) -> f32 {
    let mut weighted = 0.0f32;
    let mut total = 0.0f32;
    for (i, &m) in magnitudes.iter().enumerate() {
        weighted += i as f32 * bin_hz * m;
        total += m;
    }
    if total > 0.0 { weighted / total } else { 0.0 }
}

/// Frequency below which 85% of spectral energy is contained.
fn spectral_rolloff(magnitudes: &[f32], bin_hz: f32, threshold: f32) -> f32 {
    let total: f32 = magnitudes.iter().map(|m| m * m).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let target = total * threshold;
    let mut cumulative = 0.0f32;
    for (i, &m) in magnitudes.iter().enumerate() {
        cumulative += m * m;
        if cumulative >= target {
            return i as f32 * bin_hz;
        }
    }
    (magnitudes.len() - 1) as f32 * bin_hz
}

/// Average magnitude within each of the five bands in `BANDS`.
fn band_energies(magnitudes: &[f32], bin_hz: f32) -> [f32; 5] {
    let mut out = [0.0f32; 5];
    for (slot, &(lo, hi)) in out.iter_mut().zip(BANDS.iter()) {
        let lo_bin = (lo / bin_hz).floor().max(0.0) as usize;
        let hi_bin = if hi.is_finite() {
            ((hi / bin_hz).ceil() as usize).min(magnitudes.len())
        } else {
            magnitudes.len()
        };
        if hi_bin > lo_bin {
            let sum: f32 = magnitudes[lo_bin..hi_bin].iter().sum();
            *slot = sum / (hi_bin - lo_bin) as f32;
        }
    }
    out
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank over the FFT's positive-frequency bins.
fn build_mel_filterbank(num_filters: usize, bin_count: usize, sample_rate: f32) -> Vec<Vec<f32>> {
    let nyquist = sample_rate / 2.0;
    let mel_lo = hz_to_mel(0.0);
    let mel_hi = hz_to_mel(nyquist);

    let mel_points: Vec<f32> = (0..num_filters + 2)
        .map(|i| mel_lo + (mel_hi - mel_lo) * i as f32 / (num_filters + 1) as f32)
        .collect();
    let hz_points: Vec<f32> = mel_points.into_iter().map(mel_to_hz).collect();
    let bin_points: Vec<usize> = hz_points
        .iter()
        .map(|&hz| ((hz / nyquist) * (bin_count - 1) as f32).round() as usize)
        .collect();

    (0..num_filters)
        .map(|m| {
            let (lo, mid, hi) = (bin_points[m], bin_points[m + 1], bin_points[m + 2]);
            let mut filter = vec![0.0f32; bin_count];
            for b in lo..mid.max(lo + 1) {
                if b < bin_count && mid > lo {
                    filter[b] = (b - lo) as f32 / (mid - lo) as f32;
                }
            }
            for b in mid..hi.max(mid + 1) {
                if b < bin_count && hi > mid {
                    filter[b] = (hi - b) as f32 / (hi - mid) as f32;
                }
            }
            filter
        })
        .collect()
}

/// Mel filterbank log-energies through a DCT-II to produce 13 MFCCs.
fn mfcc13(magnitudes: &[f32], mel_filterbank: &[Vec<f32>]) -> [f32; 13] {
    let log_energies: Vec<f32> = mel_filterbank
        .iter()
        .map(|filter| {
            let energy: f32 = filter
                .iter()
                .zip(magnitudes.iter())
                .map(|(&w, &m)| w * m * m)
                .sum();
            (energy.max(1e-10)).ln()
        })
        .collect();

    let n_filters = log_energies.len();
    let mut out = [0.0f32; 13];
    for (k, slot) in out.iter_mut().enumerate() {
        let mut sum = 0.0f32;
        for (n, &e) in log_energies.iter().enumerate() {
            sum += e
                * (std::f32::consts::PI * k as f32 * (n as f32 + 0.5) / n_filters as f32).cos();
        }
        *slot = sum;
    }
    out
}

/// Fold FFT bin energy into 12 pitch classes relative to A4 = 440 Hz.
fn chroma12(magnitudes: &[f32], bin_hz: f32) -> [f32; 12] {
    let mut chroma = [0.0f32; 12];
    for (i, &m) in magnitudes.iter().enumerate().skip(1) {
        let freq = i as f32 * bin_hz;
        if freq < 20.0 {
            continue;
        }
        let note = 12.0 * (freq / 440.0).log2();
        let pitch_class = ((note.round() as i32).rem_euclid(12)) as usize;
        chroma[pitch_class] += m;
    }
    let max = chroma.iter().cloned().fold(0.0f32, f32::max);
    if max > 0.0 {
        for c in chroma.iter_mut() {
            *c /= max;
        }
    }
    chroma
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_window(freq: f32, sample_rate: f32) -> Vec<f32> {
        (0..ANALYSIS_BUFFER_SIZE)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn centroid_of_low_tone_is_low() {
        let mut analyzer = SpectralAnalyzer::new(48_000.0);
        let buf = sine_window(110.0, 48_000.0);
        let frame = analyzer.analyze(&buf);
        assert!(frame.centroid < 1000.0, "centroid was {}", frame.centroid);
    }

    #[test]
    fn bands_sum_roughly_to_full_energy_order() {
        let mut analyzer = SpectralAnalyzer::new(48_000.0);
        let buf = sine_window(3000.0, 48_000.0);
        let frame = analyzer.analyze(&buf);
        // energy should be concentrated in the mid/high-mid bands for a 3kHz tone
        assert!(frame.bands[2] + frame.bands[3] > frame.bands[0]);
    }

    #[test]
    fn mfcc_and_chroma_are_finite() {
        let mut analyzer = SpectralAnalyzer::new(44_100.0);
        let buf = sine_window(440.0, 44_100.0);
        let frame = analyzer.analyze(&buf);
        assert!(frame.mfcc.iter().all(|v| v.is_finite()));
        assert!(frame.chroma.iter().all(|v| v.is_finite()));
    }
}
