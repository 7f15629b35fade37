use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to spawn ffmpeg: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("ffmpeg exited with a failure: {0}")]
    FfmpegFailed(String),
}

pub type EncodeResult<T> = Result<T, EncodeError>;
