//! `ControlParam`: the tagged value spec telling the renderer how to
//! compute a shader uniform at a given time.

use serde::{Deserialize, Deserializer, Serialize};

use nr_core::{clamp01, lerp, lerp_range};
use nr_features::AudioFeatures;

/// Easing curve for `Evolving` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Curve {
    Linear,
    EaseIn,
    EaseOut,
    Sine,
    Bounce,
}

impl Curve {
    fn apply(self, u: f32) -> f32 {
        match self {
            Curve::Linear => u,
            Curve::EaseIn => u * u,
            Curve::EaseOut => 1.0 - (1.0 - u) * (1.0 - u),
            Curve::Sine => (u * std::f32::consts::FRAC_PI_2).sin(),
            Curve::Bounce => (u * 4.0 * std::f32::consts::PI).sin() * (1.0 - u) + u,
        }
    }
}

/// Which audio-derived scalar an `AudioReactive` param reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AudioSource {
    Rms,
    Zcr,
    SpectralCentroid,
    SpectralRolloff,
    SpectralFlux,
    Bass,
    LowMid,
    Mid,
    HighMid,
    High,
    Loudness,
    Energy,
    Beat { min_confidence: f32 },
    Mfcc { coefficient: u8 },
    Chroma { note: u8 },
}

/// A value descriptor: constant, time-evolving, or audio-reactive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControlParam {
    Static {
        #[serde(default)]
        value: f32,
    },
    Evolving {
        #[serde(default)]
        start: f32,
        #[serde(default)]
        end: f32,
        #[serde(default = "default_curve")]
        curve: Curve,
    },
    AudioReactive {
        source: AudioSource,
        #[serde(default = "default_range")]
        range: [f32; 2],
        #[serde(default)]
        smoothing: f32,
    },
}

/// Mirrors `ControlParam`'s wire shape exactly, but through the derive so a
/// single bad entry can be caught and defaulted instead of failing the
/// whole flattened param map (an unrecognized `type` tag, or a known
/// variant missing a required field, are both recovered, not fatal).
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ControlParamWire {
    Static {
        #[serde(default)]
        value: f32,
    },
    Evolving {
        #[serde(default)]
        start: f32,
        #[serde(default)]
        end: f32,
        #[serde(default = "default_curve")]
        curve: Curve,
    },
    AudioReactive {
        source: AudioSource,
        #[serde(default = "default_range")]
        range: [f32; 2],
        #[serde(default)]
        smoothing: f32,
    },
}

impl From<ControlParamWire> for ControlParam {
    fn from(wire: ControlParamWire) -> Self {
        match wire {
            ControlParamWire::Static { value } => ControlParam::Static { value },
            ControlParamWire::Evolving { start, end, curve } => {
                ControlParam::Evolving { start, end, curve }
            }
            ControlParamWire::AudioReactive {
                source,
                range,
                smoothing,
            } => ControlParam::AudioReactive {
                source,
                range,
                smoothing,
            },
        }
    }
}

impl<'de> Deserialize<'de> for ControlParam {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match serde_json::from_value::<ControlParamWire>(value) {
            Ok(wire) => Ok(wire.into()),
            Err(e) => {
                log::warn!("malformed control param, falling back to default: {e}");
                Ok(ControlParam::default())
            }
        }
    }
}

fn default_curve() -> Curve {
    Curve::Linear
}

fn default_range() -> [f32; 2] {
    [0.0, 1.0]
}

impl ControlParam {
    pub const fn constant(value: f32) -> Self {
        ControlParam::Static { value }
    }
}

impl Default for ControlParam {
    fn default() -> Self {
        ControlParam::Static { value: 0.0 }
    }
}

/// Evaluate a `ControlParam` at `(time_s, audio_frame_idx)` into a scalar
/// Never panics; malformed input yields `0.0`.
pub fn evaluate(
    param: &ControlParam,
    time_s: f64,
    duration_s: f64,
    features: &AudioFeatures,
    audio_frame_idx: usize,
) -> f32 {
    match param {
        ControlParam::Static { value } => *value,
        ControlParam::Evolving { start, end, curve } => {
            let u = if duration_s > 0.0 {
                clamp01((time_s / duration_s) as f32)
            } else {
                0.0
            };
            lerp(*start, *end, curve.apply(u))
        }
        ControlParam::AudioReactive {
            source,
            range,
            smoothing: _,
        } => {
            // smoothing is accepted but intentionally a no-op here, since
            // this function carries no state between calls; see
            // `SmoothedParam` for callers that want real EMA smoothing.
            let raw = read_source(source, features, time_s, audio_frame_idx);
            lerp_range(*range, raw)
        }
    }
}

fn read_source(
    source: &AudioSource,
    features: &AudioFeatures,
    time_s: f64,
    idx: usize,
) -> f32 {
    let series = &features.series;
    let at = |v: &[f32]| v.get(idx).copied().unwrap_or(0.0);

    match source {
        AudioSource::Rms => at(&series.rms),
        AudioSource::Zcr => at(&series.zcr),
        AudioSource::SpectralCentroid => at(&series.spectral_centroid),
        AudioSource::SpectralRolloff => at(&series.spectral_rolloff),
        AudioSource::SpectralFlux => at(&series.spectral_flux),
        AudioSource::Bass => at(&series.bass),
        AudioSource::LowMid => at(&series.low_mid),
        AudioSource::Mid => at(&series.mid),
        AudioSource::HighMid => at(&series.high_mid),
        AudioSource::High => at(&series.high),
        AudioSource::Loudness => at(&series.loudness),
        AudioSource::Energy => at(&series.energy),
        AudioSource::Beat { min_confidence } => features.beat_near(time_s, *min_confidence),
        AudioSource::Mfcc { coefficient } => features
            .mfcc
            .get(idx)
            .and_then(|c| c.get(*coefficient as usize))
            .copied()
            .unwrap_or(0.0),
        AudioSource::Chroma { note } => features
            .chroma
            .get(idx)
            .and_then(|c| c.get(*note as usize))
            .copied()
            .unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nr_features::ScalarSeries;

    fn empty_features(n: usize) -> AudioFeatures {
        AudioFeatures {
            duration_s: n as f64 / 30.0,
            sample_rate: 48_000,
            tempo_bpm: 120.0,
            frame_rate: 30,
            series: ScalarSeries {
                rms: vec![0.0; n],
                zcr: vec![0.0; n],
                spectral_centroid: vec![0.0; n],
                spectral_rolloff: vec![0.0; n],
                spectral_flux: vec![0.0; n],
                bass: vec![0.0; n],
                low_mid: vec![0.0; n],
                mid: vec![0.0; n],
                high_mid: vec![0.0; n],
                high: vec![0.0; n],
                loudness: vec![0.0; n],
                energy: vec![0.0; n],
            },
            mfcc: vec![[0.0; 13]; n],
            chroma: vec![[0.0; 12]; n],
            beats: vec![],
        }
    }

    #[test]
    fn static_always_returns_value() {
        let p = ControlParam::constant(3.5);
        let f = empty_features(10);
        assert_eq!(evaluate(&p, 0.0, 1.0, &f, 0), 3.5);
        assert_eq!(evaluate(&p, 100.0, 1.0, &f, 9), 3.5);
    }

    #[test]
    fn evolving_hits_endpoints() {
        let p = ControlParam::Evolving {
            start: 10.0,
            end: 20.0,
            curve: Curve::Linear,
        };
        let f = empty_features(10);
        assert_eq!(evaluate(&p, 0.0, 5.0, &f, 0), 10.0);
        assert_eq!(evaluate(&p, 5.0, 5.0, &f, 0), 20.0);
    }

    #[test]
    fn linear_curve_is_monotonic_increasing() {
        let p = ControlParam::Evolving {
            start: 0.0,
            end: 1.0,
            curve: Curve::Linear,
        };
        let f = empty_features(10);
        let mut last = -1.0;
        for i in 0..=10 {
            let v = evaluate(&p, i as f64, 10.0, &f, 0);
            assert!(v >= last);
            last = v;
        }
    }

    #[test]
    fn malformed_audio_reactive_index_returns_zero_not_panic() {
        let p = ControlParam::AudioReactive {
            source: AudioSource::Rms,
            range: [0.0, 1.0],
            smoothing: 0.0,
        };
        let f = empty_features(0);
        assert_eq!(evaluate(&p, 0.0, 1.0, &f, 5), 0.0);
    }

    #[test]
    fn unrecognized_type_tag_decodes_to_default_instead_of_failing() {
        let parsed: ControlParam = serde_json::from_str(r#"{"type":"pulse","value":1.0}"#).unwrap();
        assert_eq!(parsed, ControlParam::default());
    }

    #[test]
    fn known_variant_missing_required_field_decodes_to_default_instead_of_failing() {
        let parsed: ControlParam = serde_json::from_str(r#"{"type":"audioReactive"}"#).unwrap();
        assert_eq!(parsed, ControlParam::default());
    }

    #[test]
    fn a_single_malformed_param_does_not_fail_the_whole_map() {
        let map: std::collections::HashMap<String, ControlParam> = serde_json::from_str(
            r#"{
                "octaves": {"type": "static", "value": 4.0},
                "scale": {"type": "pulse", "value": 2.0}
            }"#,
        )
        .unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["octaves"], ControlParam::Static { value: 4.0 });
        assert_eq!(map["scale"], ControlParam::default());
    }
}
