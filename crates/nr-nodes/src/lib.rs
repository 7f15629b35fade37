//! Generator and effect node catalog: per-kind param names/defaults,
//! embedded WGSL fragment programs, and the uniform buffer layout they
//! share.

mod catalog;
mod resolver;
mod uniforms;

pub use catalog::{
    effect_needs_feedback_texture, effect_params, effect_shader_source, generator_params,
    generator_shader_source,
};
pub use resolver::resolve_params;
pub use uniforms::NodeUniforms;

pub use nr_timeline::{EffectKind, GeneratorKind};
