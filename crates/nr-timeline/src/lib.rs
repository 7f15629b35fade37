//! Visual timeline data model and parameter evaluation.
//!
//! Owns the node-graph wire format (`VisualTimeline`, `Node`,
//! `GeneratorKind`, `EffectKind`, `BlendMode`) and the scalar evaluation
//! engine for `ControlParam` (`Static`/`Evolving`/`AudioReactive`).

mod control_param;
mod error;
mod node;
mod smoothing;
mod timeline;

pub use control_param::{evaluate, AudioSource, ControlParam, Curve};
pub use error::{TimelineError, TimelineResult};
pub use node::{
    BlendMode, EffectKind, EffectSpec, GeneratorKind, GeneratorSpec, Node, NodeBody,
};
pub use smoothing::SmoothedParam;
pub use timeline::VisualTimeline;
