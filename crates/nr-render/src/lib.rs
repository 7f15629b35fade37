//! Offscreen GPU frame compositor.

mod compositor;
mod error;
mod gpu;
mod job;

pub use compositor::Compositor;
pub use error::{RenderError, RenderResult};
pub use gpu::GpuContext;
pub use job::{WorkerFailure, WorkerJob, WorkerProgress};
