//! Audio output via `cpal`.
//!
//! [`AudioSink`] is the seam between the playback state machine and the
//! hardware: [`CpalSink`] is the production implementation, tests substitute
//! their own.  The sink owns the cpal device/stream lifecycle the same way
//! the rest of this crate owns resources — acquired lazily, held for the
//! session, released on drop.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::decode::AudioBuffer;

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

/// Errors raised when the output device cannot be acquired or driven.
///
/// All variants mean the same thing to the caller — audio is unavailable
/// right now; the feature degrades, the session continues.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no output device found on the default audio host")]
    NoDevice,

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// AudioSink trait
// ---------------------------------------------------------------------------

/// Callback invoked exactly once when a source finishes playing naturally.
///
/// Not invoked when the source is stopped explicitly — the controller
/// already knows about its own `stop()` calls.
pub type EndCallback = Box<dyn FnOnce() + Send>;

/// Low-level playback backend.
///
/// A sink plays at most one source at a time; [`start`] on a sink that is
/// already playing replaces the current source.  Implementations are used
/// from a single thread (the crate's cooperative event loop), so no `Send`
/// bound is required — `cpal::Stream` is not `Send` on every platform.
///
/// [`start`]: AudioSink::start
pub trait AudioSink {
    /// Begin playing `buffer`; call `on_end` once when it ends naturally.
    fn start(&mut self, buffer: AudioBuffer, on_end: EndCallback) -> Result<(), PlaybackError>;

    /// Halt output immediately.  Idempotent; `on_end` is **not** invoked.
    fn stop(&mut self);
}

// ---------------------------------------------------------------------------
// CpalSink
// ---------------------------------------------------------------------------

/// Production sink that writes decoded samples to the default output device.
///
/// The device is acquired on the first [`start`] call and cached for the
/// lifetime of the sink.  Each `start` builds a fresh output stream over the
/// buffer's interleaved samples; dropping the stream (on `stop`, on
/// replacement, or on sink drop) halts the hardware immediately.
///
/// [`start`]: AudioSink::start
pub struct CpalSink {
    device: Option<cpal::Device>,
    stream: Option<cpal::Stream>,
}

impl CpalSink {
    pub fn new() -> Self {
        Self {
            device: None,
            stream: None,
        }
    }

    /// Lazily acquire the default output device, keeping it for reuse.
    fn ensure_device(&mut self) -> Result<&cpal::Device, PlaybackError> {
        if self.device.is_none() {
            let host = cpal::default_host();
            let device = host.default_output_device().ok_or(PlaybackError::NoDevice)?;
            log::info!(
                "audio output device acquired: {}",
                device.name().unwrap_or_else(|_| "<unnamed>".into())
            );
            self.device = Some(device);
        }
        self.device.as_ref().ok_or(PlaybackError::NoDevice)
    }
}

impl Default for CpalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for CpalSink {
    fn start(&mut self, buffer: AudioBuffer, on_end: EndCallback) -> Result<(), PlaybackError> {
        // Replacing the stream below stops any current source, but dropping
        // it eagerly keeps the window with two live streams at zero.
        self.stop();

        let channels = buffer.channel_count().max(1) as u16;
        let config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(buffer.sample_rate()),
            buffer_size: cpal::BufferSize::Default,
        };

        let samples: Arc<Vec<f32>> = Arc::new(buffer.interleaved());
        let position = Arc::new(AtomicUsize::new(0));
        // Slot emptied on first fire so the callback runs exactly once even
        // though cpal keeps invoking the data callback with silence.
        let end_slot: Arc<Mutex<Option<EndCallback>>> = Arc::new(Mutex::new(Some(on_end)));

        let cb_samples = Arc::clone(&samples);
        let cb_position = Arc::clone(&position);
        let cb_end = Arc::clone(&end_slot);

        let device = self.ensure_device()?;
        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let start = cb_position.fetch_add(data.len(), Ordering::SeqCst);
                for (i, out) in data.iter_mut().enumerate() {
                    *out = cb_samples.get(start + i).copied().unwrap_or(0.0);
                }
                if start + data.len() >= cb_samples.len() {
                    if let Some(cb) = cb_end.lock().unwrap().take() {
                        cb();
                    }
                }
            },
            |err: cpal::StreamError| {
                log::error!("cpal output stream error: {err}");
            },
            None, // no timeout
        )?;

        stream.play()?;
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) {
        if self.stream.take().is_some() {
            log::debug!("audio output stream dropped");
        }
    }
}
