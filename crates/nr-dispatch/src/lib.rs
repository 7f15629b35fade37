//! Parallel frame dispatcher: splits the render into per-worker chunks,
//! spawns one `render-worker` process per chunk, and aggregates their
//! progress and failures.

mod chunk;
mod dispatcher;
mod error;

pub use chunk::{split_frames, worker_count, FrameChunk};
pub use dispatcher::{dispatch, DispatchOptions};
pub use error::{WorkerError, WorkerResult};
