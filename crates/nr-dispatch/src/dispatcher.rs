//! Spawns one `render-worker` child process per frame chunk, aggregates
//! their progress, and aborts every sibling the moment one fails.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, Command, Stdio};

use crossbeam_channel::{unbounded, Sender};

use nr_features::AudioFeatures;
use nr_render::{WorkerJob, WorkerProgress};
use nr_timeline::VisualTimeline;

use crate::chunk::{self, FrameChunk};
use crate::error::{WorkerError, WorkerResult};

enum WorkerEvent {
    Progress { worker: usize, frames_done: usize },
    Done { worker: usize, frames_rendered: usize },
    Failed { worker: usize, message: String },
}

pub struct DispatchOptions<'a> {
    pub worker_binary: &'a Path,
    pub output_dir: &'a Path,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub worker_count: Option<usize>,
}

/// Runs the whole parallel render. Returns frames actually produced by
/// each worker, in chunk order, for callers that want per-worker detail.
pub fn dispatch(
    features: &AudioFeatures,
    timeline: &VisualTimeline,
    options: &DispatchOptions,
    mut on_progress: impl FnMut(usize, usize),
) -> WorkerResult<Vec<usize>> {
    let total_frames = (timeline.duration_s * options.fps as f64).floor() as usize;
    let worker_count = chunk::worker_count(options.worker_count);
    let chunks = chunk::split_frames(total_frames, worker_count);

    if chunks.is_empty() {
        return Ok(vec![]);
    }

    let job_dir = options.output_dir.join("jobs");
    std::fs::create_dir_all(&job_dir).map_err(WorkerError::Spawn)?;

    let (tx, rx) = unbounded::<WorkerEvent>();
    let mut children: Vec<Child> = Vec::with_capacity(chunks.len());

    for (i, chunk) in chunks.iter().enumerate() {
        let job = build_job(features, timeline, options, *chunk);
        let job_path = job_dir.join(format!("job_{i:04}.json"));
        let job_json = serde_json::to_string(&job).map_err(|e| WorkerError::JobFile(e.to_string()))?;
        std::fs::write(&job_path, job_json).map_err(WorkerError::Spawn)?;

        let mut child = Command::new(options.worker_binary)
            .arg(&job_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        spawn_reader(i, child.stdout.take().expect("piped stdout"), tx.clone());
        children.push(child);
    }
    drop(tx);

    let mut frames_per_worker = vec![0usize; chunks.len()];
    let mut finished = vec![false; chunks.len()];
    let mut total_done = 0usize;
    let mut failure: Option<WorkerError> = None;

    for event in rx.iter() {
        match event {
            WorkerEvent::Progress { worker, frames_done } => {
                total_done = total_done - frames_per_worker[worker] + frames_done;
                frames_per_worker[worker] = frames_done;
                on_progress(total_done, total_frames);
            }
            WorkerEvent::Done {
                worker,
                frames_rendered,
            } => {
                total_done = total_done - frames_per_worker[worker] + frames_rendered;
                frames_per_worker[worker] = frames_rendered;
                finished[worker] = true;
                on_progress(total_done, total_frames);
            }
            WorkerEvent::Failed { worker, message } => {
                finished[worker] = true;
                if failure.is_none() {
                    failure = Some(WorkerError::NonZeroExit {
                        status: -1,
                        message,
                    });
                }
                break;
            }
        }
    }

    if let Some(err) = failure {
        for child in &mut children {
            let _ = child.kill();
        }
        for child in &mut children {
            let _ = child.wait();
        }
        return Err(err);
    }

    for child in &mut children {
        let status = child.wait().map_err(WorkerError::Spawn)?;
        if !status.success() {
            for sibling in &mut children {
                let _ = sibling.kill();
            }
            return Err(WorkerError::NonZeroExit {
                status: status.code().unwrap_or(-1),
                message: "render worker exited with a non-zero status".to_string(),
            });
        }
    }

    Ok(frames_per_worker)
}

fn build_job(
    features: &AudioFeatures,
    timeline: &VisualTimeline,
    options: &DispatchOptions,
    chunk: FrameChunk,
) -> WorkerJob {
    WorkerJob {
        features: features.clone(),
        timeline: timeline.clone(),
        width: options.width,
        height: options.height,
        fps: options.fps,
        frame_start: chunk.start,
        frame_end: chunk.end,
        output_dir: options.output_dir.to_path_buf(),
    }
}

fn spawn_reader(worker: usize, stdout: std::process::ChildStdout, tx: Sender<WorkerEvent>) {
    std::thread::spawn(move || {
        let reader = BufReader::new(stdout);
        let mut last_frames_done = 0usize;
        for line in reader.lines().map_while(Result::ok) {
            if let Ok(progress) = serde_json::from_str::<WorkerProgress>(&line) {
                last_frames_done = progress.frames_done;
                let _ = tx.send(WorkerEvent::Progress {
                    worker,
                    frames_done: progress.frames_done,
                });
            } else if let Ok(failure) = serde_json::from_str::<nr_render::WorkerFailure>(&line) {
                let _ = tx.send(WorkerEvent::Failed {
                    worker,
                    message: failure.error,
                });
                return;
            }
        }
        let _ = tx.send(WorkerEvent::Done {
            worker,
            frames_rendered: last_frames_done,
        });
    });
}
