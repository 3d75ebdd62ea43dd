//! Speech-recognition backend seam.
//!
//! The host platform may or may not offer continuous speech recognition.
//! [`SpeechRecognizer`] is the object-safe interface the capture controller
//! drives; availability is discovered the moment a session starts, not by
//! ambient feature sniffing — a backend without the capability fails fast
//! with [`CaptureError::Unsupported`] and the feature stays disabled for the
//! session.

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors from the speech-capture subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// No speech-recognition capability exists on this host.
    #[error("speech recognition is not available on this platform")]
    Unsupported,

    /// The backend failed to open a recognition stream.
    #[error("failed to start speech recognition: {0}")]
    Start(String),
}

// ---------------------------------------------------------------------------
// RecognitionEvent
// ---------------------------------------------------------------------------

/// Events delivered by a recognition stream.
///
/// `Result` always carries the **cumulative** segment list for the session,
/// not a delta: recognition engines revise earlier interim segments, so the
/// only safe consumer policy is a full recompute on every event (which is
/// exactly what [`CaptureController`] does).
///
/// [`CaptureController`]: super::CaptureController
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// All transcript segments recognised so far, possibly revised.
    Result { segments: Vec<String> },
    /// The stream ended (naturally or after `stop`).
    Ended,
    /// A recognition error; reported, not fatal to the session.
    Error(String),
}

// ---------------------------------------------------------------------------
// SpeechRecognizer trait
// ---------------------------------------------------------------------------

/// A continuous, interim-result speech-recognition stream.
///
/// `start` opens the stream in the given locale and delivers
/// [`RecognitionEvent`]s over `tx` until `stop` is called or the stream
/// ends on its own.  Send errors on a dropped receiver must be ignored —
/// the consumer side may be torn down first.
pub trait SpeechRecognizer {
    /// Open a continuous recognition stream.
    ///
    /// # Errors
    ///
    /// * [`CaptureError::Unsupported`] — the host has no recognition
    ///   capability.
    /// * [`CaptureError::Start`] — the capability exists but the stream
    ///   could not be opened.
    fn start(
        &mut self,
        locale: &str,
        tx: UnboundedSender<RecognitionEvent>,
    ) -> Result<(), CaptureError>;

    /// End the stream.  Idempotent.
    fn stop(&mut self);
}

// ---------------------------------------------------------------------------
// UnsupportedRecognizer
// ---------------------------------------------------------------------------

/// The capability-absent backend: every `start` fails with
/// [`CaptureError::Unsupported`].
///
/// Hosts that do provide recognition (a system speech API, a streaming STT
/// service) plug in their own [`SpeechRecognizer`]; this is the default the
/// embedding application gets when it has nothing to offer.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedRecognizer;

impl SpeechRecognizer for UnsupportedRecognizer {
    fn start(
        &mut self,
        _locale: &str,
        _tx: UnboundedSender<RecognitionEvent>,
    ) -> Result<(), CaptureError> {
        Err(CaptureError::Unsupported)
    }

    fn stop(&mut self) {}
}
