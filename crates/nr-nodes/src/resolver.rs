//! Turns a node's named `ControlParam` bag into the ordered scalar list a
//! shader's uniform buffer expects, filling in catalog defaults for any
//! param the timeline JSON omitted.

use std::collections::HashMap;

use nr_features::AudioFeatures;
use nr_timeline::{evaluate, ControlParam};

pub fn resolve_params(
    spec: &[(&'static str, f32)],
    supplied: &HashMap<String, ControlParam>,
    time_s: f64,
    duration_s: f64,
    features: &AudioFeatures,
    audio_frame_idx: usize,
) -> Vec<f32> {
    spec.iter()
        .map(|(name, default)| match supplied.get(*name) {
            Some(param) => evaluate(param, time_s, duration_s, features, audio_frame_idx),
            None => *default,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nr_features::ScalarSeries;

    fn empty_features() -> AudioFeatures {
        AudioFeatures {
            duration_s: 1.0,
            sample_rate: 48_000,
            tempo_bpm: 120.0,
            frame_rate: 30,
            series: ScalarSeries::default(),
            mfcc: vec![],
            chroma: vec![],
            beats: vec![],
        }
    }

    #[test]
    fn missing_param_falls_back_to_catalog_default() {
        let spec = [("octaves", 4.0), ("scale", 2.0)];
        let supplied = HashMap::new();
        let out = resolve_params(&spec, &supplied, 0.0, 1.0, &empty_features(), 0);
        assert_eq!(out, vec![4.0, 2.0]);
    }

    #[test]
    fn supplied_param_overrides_default() {
        let spec = [("octaves", 4.0)];
        let mut supplied = HashMap::new();
        supplied.insert("octaves".to_string(), ControlParam::constant(7.0));
        let out = resolve_params(&spec, &supplied, 0.0, 1.0, &empty_features(), 0);
        assert_eq!(out, vec![7.0]);
    }

    #[test]
    fn unrecognized_supplied_key_is_simply_unused() {
        let spec = [("octaves", 4.0)];
        let mut supplied = HashMap::new();
        supplied.insert("bogus".to_string(), ControlParam::constant(99.0));
        let out = resolve_params(&spec, &supplied, 0.0, 1.0, &empty_features(), 0);
        assert_eq!(out, vec![4.0]);
    }
}
