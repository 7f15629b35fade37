//! Final pipeline stage: muxes the rendered frame sequence and the
//! source audio track into an MP4 container.

mod encoder;
mod error;

pub use encoder::{is_available, mux};
pub use error::{EncodeError, EncodeResult};
