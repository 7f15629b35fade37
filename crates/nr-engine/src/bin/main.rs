//! Thin CLI wrapper over `nr_engine::render`.

use std::path::PathBuf;

use clap::Parser;

use nr_engine::{render, EngineError, RenderOptions};

#[derive(Parser)]
#[command(name = "render")]
struct Args {
    #[arg(long)]
    audio: PathBuf,
    #[arg(long = "out")]
    output: PathBuf,
    #[arg(long)]
    timeline: Option<PathBuf>,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    #[arg(long)]
    fps: Option<u32>,
    #[arg(long)]
    workers: Option<usize>,
}

fn main() {
    env_logger::init();
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let mut options = RenderOptions::new();
    if let Some(path) = args.timeline {
        options = options.timeline_path(path);
    }
    if let Some(width) = args.width {
        options = options.width(width);
    }
    if let Some(height) = args.height {
        options = options.height(height);
    }
    if let Some(fps) = args.fps {
        options = options.fps(fps);
    }
    if let Some(workers) = args.workers {
        options = options.worker_count(workers);
    }
    options = options.on_progress(|done, total| {
        log::info!("{done}/{total} frames rendered");
    });

    match render(&args.audio, &args.output, options) {
        Ok(result) => {
            log::info!(
                "wrote {} ({} frames, {:?})",
                result.output_path.display(),
                result.total_frames,
                result.wall_time
            );
            std::process::exit(0);
        }
        Err(err) => {
            let code = err.exit_code();
            eprintln!("render failed: {err}");
            if let EngineError::Io(_) = err {
                eprintln!("check that the audio path, output directory, and ffmpeg/ffprobe on PATH are all valid");
            }
            std::process::exit(code);
        }
    }
}
