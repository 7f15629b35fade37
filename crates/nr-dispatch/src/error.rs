use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to spawn render worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("render worker exited with status {status}: {message}")]
    NonZeroExit { status: i32, message: String },
    #[error("failed to write job file: {0}")]
    JobFile(String),
}

pub type WorkerResult<T> = Result<T, WorkerError>;
