use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("GPU adapter request failed: {0}")]
    GpuInit(String),
    #[error("shader compilation failed for node kind {0}")]
    ShaderCompile(String),
    #[error("frame readback failed: {0}")]
    Readback(String),
    #[error("PNG write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("image encode failed: {0}")]
    Image(#[from] image::ImageError),
}

pub type RenderResult<T> = Result<T, RenderError>;
