//! The `render()` driver: decode, analyze, render, encode, in that order,
//! against a temporary work directory that is retained on failure.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use nr_dispatch::DispatchOptions;
use nr_features::AudioFeatures;
use nr_timeline::VisualTimeline;

use crate::error::{EngineError, EngineResult};
use crate::options::RenderOptions;

/// Outcome of a successful render, enriched with per-worker frame counts
/// and wall-clock time for callers that want more than the bare minimum.
pub struct RenderResult {
    pub output_path: PathBuf,
    pub duration_s: f64,
    pub total_frames: usize,
    pub frames_per_worker: Vec<usize>,
    pub wall_time: Duration,
}

/// Runs the full pipeline: decode audio, extract features, load (or
/// default) the timeline, dispatch the parallel render, mux the result.
///
/// Work directory `audio.pcm` / `frames/` / `output.mp4` is left on disk
/// when any stage fails, and deleted on success unless
/// `options.keep_work_dir` is set.
pub fn render(
    audio_path: &Path,
    output_path: &Path,
    mut options: RenderOptions,
) -> EngineResult<RenderResult> {
    let started = Instant::now();

    if audio_path.as_os_str().is_empty() {
        return Err(EngineError::MissingInput("audio_path"));
    }
    if output_path.as_os_str().is_empty() {
        return Err(EngineError::MissingInput("output_path"));
    }

    let work_dir = make_work_dir(output_path)?;
    let frames_dir = work_dir.join("frames");
    std::fs::create_dir_all(&frames_dir)?;

    let result = render_inner(audio_path, output_path, &work_dir, &frames_dir, &mut options, started);

    match &result {
        Ok(_) if !options.keep_work_dir => {
            let _ = std::fs::remove_dir_all(&work_dir);
        }
        Ok(_) => {
            log::info!("keeping work directory at {}", work_dir.display());
        }
        Err(e) => {
            log::error!("render failed, retaining work directory {}: {e}", work_dir.display());
        }
    }

    result
}

fn render_inner(
    audio_path: &Path,
    output_path: &Path,
    work_dir: &Path,
    frames_dir: &Path,
    options: &mut RenderOptions,
    started: Instant,
) -> EngineResult<RenderResult> {
    let decoded = nr_audio::decode_to_pcm(audio_path)?;
    let features: AudioFeatures =
        nr_features::extract(&decoded.samples, decoded.sample_rate, decoded.duration_s)?;

    let timeline = load_timeline(options, decoded.duration_s)?;

    let worker_binary = render_worker_binary_path()?;
    let dispatch_options = DispatchOptions {
        worker_binary: worker_binary.as_path(),
        output_dir: frames_dir,
        width: options.width,
        height: options.height,
        fps: options.fps,
        worker_count: options.worker_count,
    };

    let progress = options.on_progress.as_mut();
    let frames_per_worker = match progress {
        Some(cb) => nr_dispatch::dispatch(&features, &timeline, &dispatch_options, |done, total| {
            cb(done, total)
        })?,
        None => nr_dispatch::dispatch(&features, &timeline, &dispatch_options, |_, _| {})?,
    };
    let total_frames: usize = frames_per_worker.iter().sum();

    let audio_for_mux = work_dir.join("audio.pcm");
    std::fs::copy(audio_path, &audio_for_mux)?;
    nr_encode::mux(frames_dir, &audio_for_mux, options.fps, output_path)?;

    Ok(RenderResult {
        output_path: output_path.to_path_buf(),
        duration_s: timeline.duration_s,
        total_frames,
        frames_per_worker,
        wall_time: started.elapsed(),
    })
}

fn load_timeline(options: &RenderOptions, decoded_duration_s: f64) -> EngineResult<VisualTimeline> {
    match &options.timeline_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Ok(VisualTimeline::from_json(&text)?)
        }
        None => Ok(VisualTimeline::default_for_duration(decoded_duration_s)),
    }
}

/// The work directory lives next to the requested output file so partial
/// artifacts stay discoverable after a failed run.
fn make_work_dir(output_path: &Path) -> EngineResult<PathBuf> {
    let parent = output_path.parent().unwrap_or_else(|| Path::new("."));
    let stem = output_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "render".to_string());
    let work_dir = parent.join(format!(".{stem}.nr-work"));
    std::fs::create_dir_all(&work_dir)?;
    Ok(work_dir)
}

/// `render-worker` is installed alongside this binary by cargo; workers
/// are looked up next to the running executable rather than on `PATH`.
fn render_worker_binary_path() -> EngineResult<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    let name = if cfg!(windows) {
        "render-worker.exe"
    } else {
        "render-worker"
    };
    Ok(dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_audio_path_is_rejected_before_any_work_begins() {
        let result = render(Path::new(""), Path::new("/tmp/out.mp4"), RenderOptions::new());
        assert!(matches!(result, Err(EngineError::MissingInput("audio_path"))));
    }

    #[test]
    fn empty_output_path_is_rejected_before_any_work_begins() {
        let result = render(Path::new("/tmp/in.wav"), Path::new(""), RenderOptions::new());
        assert!(matches!(result, Err(EngineError::MissingInput("output_path"))));
    }

    #[test]
    fn work_dir_name_is_derived_from_the_output_stem() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("clip.mp4");
        let work_dir = make_work_dir(&output).unwrap();
        assert!(work_dir.ends_with(".clip.nr-work"));
        assert!(work_dir.exists());
    }
}
