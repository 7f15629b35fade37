//! Per-kind param names/defaults and WGSL fragment sources.

use nr_timeline::{EffectKind, GeneratorKind};

const COMMON: &str = include_str!("shaders/common.wgsl");

macro_rules! shader {
    ($path:literal) => {
        include_str!($path)
    };
}

/// Concatenate the shared vertex stage + uniform layout with a kind's
/// fragment body into one compilable module source.
fn with_common(body: &str) -> String {
    format!("{COMMON}\n{body}")
}

/// `(name, default)` pairs in uniform-packing order. Unspecified params
/// fall back to the default; params in the wire format with no matching
/// name here are ignored, not rejected.
pub fn generator_params(kind: GeneratorKind) -> &'static [(&'static str, f32)] {
    match kind {
        GeneratorKind::PerlinNoise => &[("octaves", 4.0), ("scale", 2.0)],
        GeneratorKind::Particles => &[("count", 255.0), ("size", 2.75), ("speed", 1.05)],
        GeneratorKind::Fractal => &[("iterations", 55.0), ("zoom", 2.75)],
        GeneratorKind::Voronoi => &[("points", 27.5), ("distance", 0.5)],
        GeneratorKind::FlowField => &[("resolution", 10.5), ("strength", 1.75)],
        GeneratorKind::Geometric => &[("sides", 7.5), ("rotation", 0.0), ("scale", 0.5)],
        GeneratorKind::RadialWaves => &[("frequency", 20.0), ("amplitude", 1.0), ("speed", 2.0)],
        GeneratorKind::SolidColor => &[("color", 0.5)],
        GeneratorKind::Unknown => &[],
    }
}

pub fn effect_params(kind: EffectKind) -> &'static [(&'static str, f32)] {
    match kind {
        EffectKind::Blur => &[("radius", 10.0)],
        EffectKind::Bloom => &[("threshold", 0.5), ("intensity", 1.0)],
        EffectKind::Kaleidoscope => &[("segments", 7.0), ("rotation", std::f32::consts::PI)],
        EffectKind::ColorGrade => &[("hue", 0.5), ("saturation", 1.0), ("brightness", 1.0)],
        EffectKind::Feedback => &[("amount", 0.5), ("decay", 0.945)],
        EffectKind::ChromaticAberration => &[("amount", 0.025)],
        EffectKind::Grain => &[("amount", 0.5)],
        EffectKind::Unknown => &[],
    }
}

pub fn generator_shader_source(kind: GeneratorKind) -> Option<String> {
    let body = match kind {
        GeneratorKind::PerlinNoise => shader!("shaders/perlin_noise.wgsl"),
        GeneratorKind::Particles => shader!("shaders/particles.wgsl"),
        GeneratorKind::Fractal => shader!("shaders/fractal.wgsl"),
        GeneratorKind::Voronoi => shader!("shaders/voronoi.wgsl"),
        GeneratorKind::FlowField => shader!("shaders/flow_field.wgsl"),
        GeneratorKind::Geometric => shader!("shaders/geometric.wgsl"),
        GeneratorKind::RadialWaves => shader!("shaders/radial_waves.wgsl"),
        GeneratorKind::SolidColor => shader!("shaders/solid_color.wgsl"),
        GeneratorKind::Unknown => return None,
    };
    Some(with_common(body))
}

pub fn effect_shader_source(kind: EffectKind) -> Option<String> {
    let body = match kind {
        EffectKind::Blur => shader!("shaders/blur.wgsl"),
        EffectKind::Bloom => shader!("shaders/bloom.wgsl"),
        EffectKind::Kaleidoscope => shader!("shaders/kaleidoscope.wgsl"),
        EffectKind::ColorGrade => shader!("shaders/color_grade.wgsl"),
        EffectKind::Feedback => shader!("shaders/feedback.wgsl"),
        EffectKind::ChromaticAberration => shader!("shaders/chromatic_aberration.wgsl"),
        EffectKind::Grain => shader!("shaders/grain.wgsl"),
        EffectKind::Unknown => return None,
    };
    Some(with_common(body))
}

/// Does this effect read back its own previous output (ping-pong feedback)
/// rather than just the current source texture?
pub fn effect_needs_feedback_texture(kind: EffectKind) -> bool {
    matches!(kind, EffectKind::Feedback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_generator_has_a_shader() {
        for kind in [
            GeneratorKind::PerlinNoise,
            GeneratorKind::Particles,
            GeneratorKind::Fractal,
            GeneratorKind::Voronoi,
            GeneratorKind::FlowField,
            GeneratorKind::Geometric,
            GeneratorKind::RadialWaves,
            GeneratorKind::SolidColor,
        ] {
            assert!(generator_shader_source(kind).is_some());
            assert!(!generator_params(kind).is_empty());
        }
    }

    #[test]
    fn every_known_effect_has_a_shader() {
        for kind in [
            EffectKind::Blur,
            EffectKind::Bloom,
            EffectKind::Kaleidoscope,
            EffectKind::ColorGrade,
            EffectKind::Feedback,
            EffectKind::ChromaticAberration,
            EffectKind::Grain,
        ] {
            assert!(effect_shader_source(kind).is_some());
            assert!(!effect_params(kind).is_empty());
        }
    }

    #[test]
    fn unknown_kinds_have_no_shader() {
        assert!(generator_shader_source(GeneratorKind::Unknown).is_none());
        assert!(effect_shader_source(EffectKind::Unknown).is_none());
    }

    #[test]
    fn default_values_are_within_documented_ranges() {
        let (_, octaves) = generator_params(GeneratorKind::PerlinNoise)[0];
        assert!((1.0..=8.0).contains(&octaves));
        let (_, decay) = effect_params(EffectKind::Feedback)[1];
        assert!((0.9..=0.99).contains(&decay));
    }
}
