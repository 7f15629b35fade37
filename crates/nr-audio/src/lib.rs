//! nr-audio: Audio Decoder (C1)
//!
//! Decodes arbitrary audio to mono 32-bit float PCM at the file's native
//! sample rate by shelling out to `ffprobe` (to probe duration/sample rate)
//! and `ffmpeg` (to decode). Both binaries must be discoverable on `PATH`
//! Invoked as external subprocesses rather than linked libraries.

mod decoder;
mod error;

pub use decoder::{DecodedAudio, decode_to_pcm, probe};
pub use error::{DecodeError, DecodeResult};
