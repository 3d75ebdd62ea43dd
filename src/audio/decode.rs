//! Raw PCM decoding — headerless 16-bit little-endian → floating point.
//!
//! The oracle's speech synthesis returns raw PCM with no container header,
//! so a general-purpose audio decoder cannot parse it.  [`decode_pcm`] does
//! the one conversion this crate needs: interleaved `i16` LE bytes at a
//! known sample rate and channel count into a per-channel `f32` buffer.
//!
//! Everything here is pure sample math — no I/O, no shared state — and is
//! exercised directly with synthetic byte arrays in the tests below.

use thiserror::Error;

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

/// Errors produced while decoding a raw PCM byte stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The byte length is not a whole number of frames.
    ///
    /// A conforming service never produces this; when it appears it means
    /// something upstream corrupted or truncated the stream, so the decoder
    /// refuses rather than silently dropping the trailing partial frame.
    #[error(
        "malformed PCM data: {len} bytes is not a multiple of {frame_bytes} \
         (2 bytes x {channels} channels)"
    )]
    MalformedData {
        /// Total input length in bytes.
        len: usize,
        /// Bytes per frame (`2 * channels`).
        frame_bytes: usize,
        /// Channel count the caller declared.
        channels: u16,
    },

    /// A zero channel count makes the frame size meaningless.
    #[error("channel count must be at least 1")]
    ZeroChannels,
}

// ---------------------------------------------------------------------------
// AudioBuffer
// ---------------------------------------------------------------------------

/// Decoded audio: one ordered sequence of `f32` samples per channel.
///
/// Samples are in `[-1.0, 1.0)` (an `i16` input domain normalised by
/// `1/32768` never reaches `1.0` exactly).  The buffer has no identity of
/// its own — it is a derived artifact, superseded whenever a new narration
/// is decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Build a buffer from per-channel sample vectors.
    ///
    /// All channels must have equal length; callers inside this crate only
    /// construct buffers through [`decode_pcm`], which guarantees it.
    pub fn from_channels(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        debug_assert!(
            channels.windows(2).all(|w| w[0].len() == w[1].len()),
            "all channels must have the same frame count"
        );
        Self {
            sample_rate,
            channels,
        }
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Frames per channel (one frame = one sample per channel).
    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Samples of channel `c`.
    ///
    /// # Panics
    ///
    /// Panics when `c >= channel_count()`.
    pub fn channel(&self, c: usize) -> &[f32] {
        &self.channels[c]
    }

    /// Re-interleave the channels into a single `frame-major` sample stream,
    /// the layout the cpal output callback consumes.
    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.frame_count();
        let n = self.channel_count();
        let mut out = Vec::with_capacity(frames * n);
        for i in 0..frames {
            for ch in &self.channels {
                out.push(ch[i]);
            }
        }
        out
    }

    /// Playback duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.sample_rate as f64
    }
}

// ---------------------------------------------------------------------------
// decode_pcm
// ---------------------------------------------------------------------------

/// Decode headerless interleaved 16-bit little-endian PCM into an
/// [`AudioBuffer`].
///
/// The sample at frame `i`, channel `c` lives at integer index
/// `i * channels + c` of the interleaved input; each `i16` value is
/// normalised to `f32` via `s / 32768.0`.
///
/// # Errors
///
/// * [`DecodeError::ZeroChannels`] — `channels == 0`.
/// * [`DecodeError::MalformedData`] — `bytes.len()` is not a multiple of
///   `2 * channels`.  Truncating the trailing partial frame is deliberately
///   **not** done; silent truncation would mask upstream bugs.
///
/// # Example
///
/// ```rust
/// use oniria::audio::decode_pcm;
///
/// // Two mono frames: 0 and i16::MIN.
/// let bytes = [0x00, 0x00, 0x00, 0x80];
/// let buf = decode_pcm(&bytes, 24_000, 1).unwrap();
/// assert_eq!(buf.frame_count(), 2);
/// assert_eq!(buf.channel(0), &[0.0, -1.0]);
/// ```
pub fn decode_pcm(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<AudioBuffer, DecodeError> {
    if channels == 0 {
        return Err(DecodeError::ZeroChannels);
    }

    let n = channels as usize;
    let frame_bytes = 2 * n;
    if bytes.len() % frame_bytes != 0 {
        return Err(DecodeError::MalformedData {
            len: bytes.len(),
            frame_bytes,
            channels,
        });
    }

    let samples: Vec<f32> = bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32_768.0)
        .collect();

    let frames = samples.len() / n;
    let mut out: Vec<Vec<f32>> = vec![Vec::with_capacity(frames); n];
    for (idx, s) in samples.into_iter().enumerate() {
        out[idx % n].push(s);
    }

    Ok(AudioBuffer::from_channels(sample_rate, out))
}

// ---------------------------------------------------------------------------
// encode_pcm  (reference encoder)
// ---------------------------------------------------------------------------

/// Encode per-channel `f32` samples back into interleaved 16-bit LE PCM.
///
/// The inverse of [`decode_pcm`] up to `i16` quantisation; used to build
/// synthetic fixtures in tests and kept public because embedding
/// applications occasionally need to re-export narration audio.
///
/// Samples are clamped to `[-1.0, 1.0]` before scaling, so out-of-range
/// input cannot wrap.
pub fn encode_pcm(buffer: &AudioBuffer) -> Vec<u8> {
    let mut out = Vec::with_capacity(buffer.frame_count() * buffer.channel_count() * 2);
    for s in buffer.interleaved() {
        let q = (s.clamp(-1.0, 1.0) * 32_768.0).clamp(-32_768.0, 32_767.0) as i16;
        out.extend_from_slice(&q.to_le_bytes());
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
