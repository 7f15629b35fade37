//! `Node`, its generator/effect kinds, and the blend-mode enum
//! decoded straight from the timeline JSON wire format.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::control_param::ControlParam;

/// Compositing blend mode used when mixing a node into the accumulator
/// when compositing it into the frame accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlendMode {
    Normal,
    Add,
    Screen,
    Multiply,
}

impl Default for BlendMode {
    fn default() -> Self {
        BlendMode::Normal
    }
}

/// Generator shader kinds. Unknown kinds decode to
/// `Unknown` rather than failing; unrecognized node kinds are skipped at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GeneratorKind {
    PerlinNoise,
    Particles,
    Fractal,
    Voronoi,
    FlowField,
    Geometric,
    RadialWaves,
    SolidColor,
    #[serde(other)]
    Unknown,
}

/// Effect shader kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    Blur,
    Bloom,
    Kaleidoscope,
    ColorGrade,
    Feedback,
    ChromaticAberration,
    Grain,
    #[serde(other)]
    Unknown,
}

/// The `generator`/`effect` sub-object from the wire format: a `name`
/// (the kind) plus an open bag of named params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSpec {
    pub name: GeneratorKind,
    #[serde(flatten)]
    pub params: HashMap<String, ControlParam>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectSpec {
    pub name: EffectKind,
    #[serde(flatten)]
    pub params: HashMap<String, ControlParam>,
}

/// A generator or effect payload. Tagged by Node's `type` field and
/// carrying the matching `generator`/`effect` sub-object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeBody {
    Generator { generator: GeneratorSpec },
    Effect { effect: EffectSpec },
}

/// One element of the visual timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(rename = "startTime")]
    pub start_time_s: f64,
    #[serde(rename = "endTime")]
    pub end_time_s: f64,
    #[serde(rename = "fadeIn", skip_serializing_if = "Option::is_none")]
    pub fade_in_s: Option<f64>,
    #[serde(rename = "fadeOut", skip_serializing_if = "Option::is_none")]
    pub fade_out_s: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity_base: Option<f32>,
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(flatten)]
    pub body: NodeBody,
}

fn default_true() -> bool {
    true
}

impl Node {
    pub fn is_generator(&self) -> bool {
        matches!(self.body, NodeBody::Generator { .. })
    }

    pub fn is_effect(&self) -> bool {
        matches!(self.body, NodeBody::Effect { .. })
    }

    /// Validate the per-node structural invariants. Unknown kinds and
    /// param names are NOT validated here — only the structural
    /// `start ≤ end` / fade budget invariants are fatal.
    pub fn validate(&self, timeline_duration_s: f64) -> Result<(), String> {
        if self.start_time_s < 0.0 || self.start_time_s > self.end_time_s {
            return Err(format!(
                "node {}: startTime ({}) must be in [0, endTime ({})]",
                self.id, self.start_time_s, self.end_time_s
            ));
        }
        if self.end_time_s > timeline_duration_s {
            return Err(format!(
                "node {}: endTime ({}) exceeds timeline duration ({})",
                self.id, self.end_time_s, timeline_duration_s
            ));
        }
        let fade_budget = self.fade_in_s.unwrap_or(0.0) + self.fade_out_s.unwrap_or(0.0);
        if fade_budget > self.end_time_s - self.start_time_s {
            return Err(format!(
                "node {}: fadeIn + fadeOut ({}) exceeds node span ({})",
                self.id,
                fade_budget,
                self.end_time_s - self.start_time_s
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(start: f64, end: f64, fade_in: Option<f64>, fade_out: Option<f64>) -> Node {
        Node {
            id: "n1".into(),
            enabled: true,
            start_time_s: start,
            end_time_s: end,
            fade_in_s: fade_in,
            fade_out_s: fade_out,
            opacity_base: None,
            blend_mode: BlendMode::Normal,
            body: NodeBody::Generator {
                generator: GeneratorSpec {
                    name: GeneratorKind::SolidColor,
                    params: HashMap::new(),
                },
            },
        }
    }

    #[test]
    fn start_after_end_is_rejected() {
        let n = node(5.0, 1.0, None, None);
        assert!(n.validate(10.0).is_err());
    }

    #[test]
    fn fade_budget_exceeding_span_is_rejected() {
        let n = node(0.0, 1.0, Some(0.6), Some(0.6));
        assert!(n.validate(10.0).is_err());
    }

    #[test]
    fn valid_node_passes() {
        let n = node(0.0, 5.0, Some(1.0), Some(1.0));
        assert!(n.validate(10.0).is_ok());
    }

    #[test]
    fn unknown_generator_kind_decodes_to_unknown_variant() {
        let parsed: GeneratorKind = serde_json::from_str("\"totally-unknown\"").unwrap();
        assert_eq!(parsed, GeneratorKind::Unknown);
    }

    #[test]
    fn node_with_unrecognized_param_variant_still_decodes() {
        let json = r#"{
            "id": "bg-noise",
            "startTime": 0.0,
            "endTime": 5.0,
            "type": "generator",
            "generator": {
                "name": "perlinNoise",
                "octaves": {"type": "static", "value": 4.0},
                "scale": {"type": "pulse", "value": 2.0}
            }
        }"#;
        let node: Node = serde_json::from_str(json).expect("malformed param must not be fatal");
        match node.body {
            NodeBody::Generator { generator } => {
                assert_eq!(generator.params.len(), 2);
                assert_eq!(
                    generator.params["octaves"],
                    ControlParam::Static { value: 4.0 }
                );
                assert_eq!(generator.params["scale"], ControlParam::default());
            }
            _ => panic!("expected generator"),
        }
    }

    #[test]
    fn node_with_audio_reactive_param_missing_source_still_decodes() {
        let json = r#"{
            "id": "flash",
            "startTime": 0.0,
            "endTime": 5.0,
            "type": "effect",
            "effect": {
                "name": "bloom",
                "intensity": {"type": "audioReactive"}
            }
        }"#;
        let node: Node = serde_json::from_str(json).expect("missing required field must not be fatal");
        match node.body {
            NodeBody::Effect { effect } => {
                assert_eq!(effect.params["intensity"], ControlParam::default());
            }
            _ => panic!("expected effect"),
        }
    }

    #[test]
    fn node_deserializes_from_wire_shape() {
        let json = r#"{
            "id": "bg-noise",
            "enabled": true,
            "startTime": 0.0,
            "endTime": 5.0,
            "fadeIn": 1.0,
            "type": "generator",
            "generator": {
                "name": "perlinNoise",
                "octaves": {"type": "static", "value": 4.0},
                "scale": {"type": "static", "value": 2.0}
            }
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.id, "bg-noise");
        match node.body {
            NodeBody::Generator { generator } => {
                assert_eq!(generator.name, GeneratorKind::PerlinNoise);
                assert_eq!(generator.params.len(), 2);
            }
            _ => panic!("expected generator"),
        }
    }
}
