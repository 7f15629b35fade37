//! The top-level `VisualTimeline` container: background color plus the
//! ordered list of generator/effect nodes.

use serde::{Deserialize, Serialize};

use crate::control_param::ControlParam;
use crate::error::{TimelineError, TimelineResult};
use crate::node::Node;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualTimeline {
    #[serde(rename = "duration")]
    pub duration_s: f64,
    #[serde(default = "default_background", rename = "backgroundColor")]
    pub background_color: ControlParam,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

fn default_background() -> ControlParam {
    ControlParam::constant(0.0)
}

impl VisualTimeline {
    /// Parse a timeline from its JSON wire format and reject it outright if
    /// it fails structural validation, rather than deferring to render time.
    pub fn from_json(text: &str) -> TimelineResult<Self> {
        let timeline: VisualTimeline = serde_json::from_str(text)?;
        timeline.validate()?;
        Ok(timeline)
    }

    pub fn validate(&self) -> TimelineResult<()> {
        if self.duration_s <= 0.0 {
            return Err(TimelineError::NonPositiveDuration(self.duration_s));
        }
        for node in &self.nodes {
            node.validate(self.duration_s)
                .map_err(TimelineError::InvalidNode)?;
        }
        Ok(())
    }

    /// A single full-frame solid-color generator spanning the whole clip,
    /// used when the caller supplies audio but no timeline.
    pub fn default_for_duration(duration_s: f64) -> Self {
        use crate::node::{BlendMode, GeneratorKind, GeneratorSpec, NodeBody};
        use std::collections::HashMap;

        let mut params = HashMap::new();
        params.insert("brightness".to_string(), ControlParam::constant(0.5));

        VisualTimeline {
            duration_s,
            background_color: ControlParam::constant(0.0),
            nodes: vec![Node {
                id: "default-generator".to_string(),
                enabled: true,
                start_time_s: 0.0,
                end_time_s: duration_s,
                fade_in_s: None,
                fade_out_s: None,
                opacity_base: None,
                blend_mode: BlendMode::Normal,
                body: NodeBody::Generator {
                    generator: GeneratorSpec {
                        name: GeneratorKind::PerlinNoise,
                        params,
                    },
                },
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_duration_is_rejected() {
        let t = VisualTimeline {
            duration_s: 0.0,
            background_color: ControlParam::constant(0.0),
            nodes: vec![],
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn default_for_duration_passes_validation() {
        let t = VisualTimeline::default_for_duration(12.0);
        assert!(t.validate().is_ok());
        assert_eq!(t.nodes.len(), 1);
    }

    #[test]
    fn from_json_rejects_malformed_text() {
        assert!(VisualTimeline::from_json("not json").is_err());
    }

    #[test]
    fn from_json_rejects_node_past_duration() {
        let json = r#"{
            "duration": 2.0,
            "nodes": [{
                "id": "a",
                "startTime": 0.0,
                "endTime": 5.0,
                "type": "generator",
                "generator": { "name": "solidColor" }
            }]
        }"#;
        assert!(VisualTimeline::from_json(json).is_err());
    }

    #[test]
    fn from_json_accepts_well_formed_timeline() {
        let json = r#"{
            "duration": 10.0,
            "nodes": [{
                "id": "a",
                "startTime": 0.0,
                "endTime": 10.0,
                "type": "effect",
                "effect": { "name": "bloom", "intensity": {"type": "static", "value": 0.4} }
            }]
        }"#;
        let t = VisualTimeline::from_json(json).unwrap();
        assert_eq!(t.nodes.len(), 1);
    }
}
