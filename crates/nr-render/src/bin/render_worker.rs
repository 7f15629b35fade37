//! Child process spawned once per chunk by the parallel dispatcher.
//! Reads a `WorkerJob` from a JSON file, renders its frame range, and
//! writes PNGs into the shared output directory. Progress and failures
//! are reported as newline-delimited JSON on stdout.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;

use nr_render::{Compositor, GpuContext, WorkerFailure, WorkerJob, WorkerProgress};

#[derive(Parser)]
struct Args {
    /// Path to the JSON-encoded `WorkerJob` file
    job: PathBuf,
}

const PROGRESS_INTERVAL: usize = 10;

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(err) = run(&args.job) {
        let failure = WorkerFailure {
            error: err.to_string(),
        };
        println!("{}", serde_json::to_string(&failure).unwrap());
        std::process::exit(1);
    }
}

fn run(job_path: &PathBuf) -> anyhow::Result<()> {
    let job_text = std::fs::read_to_string(job_path)?;
    let job: WorkerJob = serde_json::from_str(&job_text)?;

    std::fs::create_dir_all(&job.output_dir)?;

    let ctx = std::sync::Arc::new(GpuContext::new_blocking()?);
    let mut compositor = Compositor::new(ctx, job.width, job.height)?;

    let stdout = std::io::stdout();
    let mut frames_done = 0usize;

    for frame_idx in job.frame_start..job.frame_end {
        let time_s = frame_idx as f64 / job.fps as f64;
        let pixels = compositor.render_frame(&job.timeline, &job.features, time_s)?;

        let path = job
            .output_dir
            .join(format!("frame_{:06}.png", frame_idx));
        image::save_buffer(
            &path,
            &pixels,
            job.width,
            job.height,
            image::ColorType::Rgba8,
        )?;

        frames_done += 1;
        if frames_done % PROGRESS_INTERVAL == 0 {
            let progress = WorkerProgress { frames_done };
            let mut handle = stdout.lock();
            writeln!(handle, "{}", serde_json::to_string(&progress)?)?;
            handle.flush()?;
        }
    }

    let progress = WorkerProgress { frames_done };
    println!("{}", serde_json::to_string(&progress)?);
    Ok(())
}
