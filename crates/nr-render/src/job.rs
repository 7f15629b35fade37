use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use nr_features::AudioFeatures;
use nr_timeline::VisualTimeline;

/// The full job payload a render worker process reads from its job file.
/// Each worker gets the complete `AudioFeatures` and `VisualTimeline` and
/// renders only its own contiguous frame range.
#[derive(Debug, Serialize, Deserialize)]
pub struct WorkerJob {
    pub features: AudioFeatures,
    pub timeline: VisualTimeline,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub frame_start: usize,
    pub frame_end: usize,
    pub output_dir: PathBuf,
}

/// A worker's progress heartbeat, written as one JSON line per update.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorkerProgress {
    #[serde(rename = "framesDone")]
    pub frames_done: usize,
}

/// Emitted as the last line on failure, before the worker exits non-zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerFailure {
    pub error: String,
}
