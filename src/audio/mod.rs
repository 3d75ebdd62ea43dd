//! Audio pipeline — raw PCM decoding → playback controller → cpal output.
//!
//! # Pipeline
//!
//! ```text
//! oracle TTS (raw i16 LE PCM) → decode_pcm → AudioBuffer
//!                                → PlaybackController → AudioSink (cpal)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use oniria::audio::{decode_pcm, PlaybackController};
//!
//! // 24 kHz mono is the fixed contract of the speech service.
//! let bytes = vec![0u8; 48_000];
//! let buffer = decode_pcm(&bytes, 24_000, 1).unwrap();
//!
//! let mut playback = PlaybackController::with_default_output();
//! playback.toggle(buffer).unwrap();
//! ```

pub mod decode;
pub mod playback;
pub mod sink;

pub use decode::{decode_pcm, encode_pcm, AudioBuffer, DecodeError};
pub use playback::{PlaybackController, PlaybackState};
pub use sink::{AudioSink, CpalSink, EndCallback, PlaybackError};
