//! Muxes a frame sequence and an audio track into an MP4 via an
//! external `ffmpeg` subprocess.

use std::path::Path;
use std::process::Command;

use crate::error::{EncodeError, EncodeResult};

/// Runs `ffmpeg` over `frame_%06d.png` files in `frames_dir` plus the audio
/// at `audio_path`, writing a faststart H.264/AAC MP4 to `output_path`.
pub fn mux(frames_dir: &Path, audio_path: &Path, fps: u32, output_path: &Path) -> EncodeResult<()> {
    let frame_pattern = frames_dir.join("frame_%06d.png");

    log::info!(
        "encoding {} @ {fps}fps + {} -> {}",
        frame_pattern.display(),
        audio_path.display(),
        output_path.display()
    );

    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-framerate")
        .arg(fps.to_string())
        .arg("-i")
        .arg(&frame_pattern)
        .arg("-i")
        .arg(audio_path)
        .arg("-map")
        .arg("0:v")
        .arg("-map")
        .arg("1:a")
        .arg("-r")
        .arg(fps.to_string())
        .arg("-c:v")
        .arg("h264")
        .arg("-preset")
        .arg("medium")
        .arg("-crf")
        .arg("20")
        .arg("-pix_fmt")
        .arg("yuv420p")
        .arg("-c:a")
        .arg("aac")
        .arg("-b:a")
        .arg("192k")
        .arg("-shortest")
        .arg("-movflags")
        .arg("+faststart")
        .arg(output_path)
        .output()?;

    if !output.status.success() {
        return Err(EncodeError::FfmpegFailed(
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ));
    }

    Ok(())
}

/// True if an `ffmpeg` binary can be located and executed.
pub fn is_available() -> bool {
    Command::new("ffmpeg").arg("-version").output().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn mux_fails_loudly_when_ffmpeg_is_missing_or_inputs_absent() {
        let frames_dir = PathBuf::from("/nonexistent/frames");
        let audio_path = PathBuf::from("/nonexistent/audio.wav");
        let output_path = PathBuf::from("/nonexistent/output.mp4");
        let result = mux(&frames_dir, &audio_path, 30, &output_path);
        assert!(result.is_err());
    }
}
