//! Speech capture — dictating the dream narrative into the text field.
//!
//! [`CaptureController`] wraps one continuous, interim-result recognition
//! session.  When a session starts it snapshots the text field
//! (`base_text`); every recognition update then recomputes the *entire*
//! visible text as `base_text + " " + cumulative transcript`.  Appending
//! deltas instead would duplicate text the moment the engine revises an
//! earlier interim segment — the full recompute is the correctness policy,
//! not an optimisation.
//!
//! ```text
//! Idle ──start(current_text)──▶ Listening ──stop / Ended / Error──▶ Idle
//! ```
//!
//! The controller is driven by [`RecognitionEvent`]s the embedding
//! application reads off the channel it handed to [`start`]; tests drive
//! the same path with hand-made events, no microphone involved.
//!
//! [`start`]: CaptureController::start

pub mod recognizer;

pub use recognizer::{CaptureError, RecognitionEvent, SpeechRecognizer, UnsupportedRecognizer};

use tokio::sync::mpsc::UnboundedSender;

// ---------------------------------------------------------------------------
// CaptureState
// ---------------------------------------------------------------------------

/// Observable states of the capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// No recognition stream open.
    Idle,
    /// A continuous recognition stream is delivering events.
    Listening,
}

// ---------------------------------------------------------------------------
// merge_transcript
// ---------------------------------------------------------------------------

/// Combine the base snapshot with the cumulative transcript.
///
/// A single separating space is inserted only when both sides are
/// non-empty.
///
/// # Example
///
/// ```rust
/// use oniria::capture::merge_transcript;
///
/// assert_eq!(merge_transcript("hola", "mundo"), "hola mundo");
/// assert_eq!(merge_transcript("", "mundo"), "mundo");
/// assert_eq!(merge_transcript("hola", ""), "hola");
/// ```
pub fn merge_transcript(base: &str, transcript: &str) -> String {
    if base.is_empty() || transcript.is_empty() {
        format!("{base}{transcript}")
    } else {
        format!("{base} {transcript}")
    }
}

// ---------------------------------------------------------------------------
// CaptureController
// ---------------------------------------------------------------------------

/// Owns the one live capture session.
///
/// Generic over the backend so tests inject a scripted recognizer and the
/// embedding application injects whatever engine the platform offers.
pub struct CaptureController<R: SpeechRecognizer> {
    recognizer: R,
    locale: String,
    state: CaptureState,
    base_text: String,
}

impl<R: SpeechRecognizer> CaptureController<R> {
    /// `locale` is fixed for the controller's lifetime (e.g. `"es-ES"`).
    pub fn new(recognizer: R, locale: impl Into<String>) -> Self {
        Self {
            recognizer,
            locale: locale.into(),
            state: CaptureState::Idle,
            base_text: String::new(),
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == CaptureState::Listening
    }

    /// Begin a capture session, snapshotting `current_text` as the base the
    /// transcript is merged onto.
    ///
    /// A no-op while already listening — callers wanting a fresh base must
    /// [`stop`] first.
    ///
    /// # Errors
    ///
    /// [`CaptureError::Unsupported`] / [`CaptureError::Start`] from the
    /// backend; the controller stays `Idle` on failure.
    ///
    /// [`stop`]: CaptureController::stop
    pub fn start(
        &mut self,
        current_text: &str,
        tx: UnboundedSender<RecognitionEvent>,
    ) -> Result<(), CaptureError> {
        if self.state == CaptureState::Listening {
            return Ok(());
        }
        self.recognizer.start(&self.locale, tx)?;
        self.base_text = current_text.to_string();
        self.state = CaptureState::Listening;
        log::debug!("speech capture started (locale {})", self.locale);
        Ok(())
    }

    /// End the session.  Idempotent and synchronous.
    pub fn stop(&mut self) {
        if self.state == CaptureState::Listening {
            self.recognizer.stop();
            self.state = CaptureState::Idle;
            log::debug!("speech capture stopped");
        }
    }

    /// Feed one recognition event through the merge policy.
    ///
    /// Returns the new full text-field value when the event produces one;
    /// `Ended` and `Error` transition back to `Idle` and return `None`
    /// (errors are logged, never fatal).  Result events that arrive after
    /// the session ended are ignored.
    pub fn handle_event(&mut self, event: RecognitionEvent) -> Option<String> {
        match event {
            RecognitionEvent::Result { segments } => {
                if self.state != CaptureState::Listening {
                    return None;
                }
                let transcript: String = segments.concat();
                Some(merge_transcript(&self.base_text, &transcript))
            }
            RecognitionEvent::Ended => {
                self.state = CaptureState::Idle;
                None
            }
            RecognitionEvent::Error(msg) => {
                log::warn!("speech recognition error: {msg}");
                self.state = CaptureState::Idle;
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Scripted backend: records start/stop calls, never emits on its own.
    #[derive(Default)]
    struct MockRecognizer {
        starts: usize,
        stops: usize,
    }

    impl SpeechRecognizer for MockRecognizer {
        fn start(
            &mut self,
            _locale: &str,
            _tx: UnboundedSender<RecognitionEvent>,
        ) -> Result<(), CaptureError> {
            self.starts += 1;
            Ok(())
        }

        fn stop(&mut self) {
            self.stops += 1;
        }
    }

    // The mock backends never send, so the receiver can be dropped.
    fn channel() -> UnboundedSender<RecognitionEvent> {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        tx
    }

    fn listening(base: &str) -> CaptureController<MockRecognizer> {
        let mut ctl = CaptureController::new(MockRecognizer::default(), "es-ES");
        ctl.start(base, channel()).unwrap();
        ctl
    }

    // ---- merge_transcript ---

    #[test]
    fn merge_inserts_space_only_when_both_non_empty() {
        assert_eq!(merge_transcript("hola", "mundo"), "hola mundo");
        assert_eq!(merge_transcript("", "mundo"), "mundo");
        assert_eq!(merge_transcript("hola", ""), "hola");
        assert_eq!(merge_transcript("", ""), "");
    }

    // ---- state machine ---

    #[test]
    fn start_transitions_to_listening() {
        let ctl = listening("");
        assert_eq!(ctl.state(), CaptureState::Listening);
    }

    #[test]
    fn start_while_listening_is_a_noop() {
        let mut ctl = listening("primera");
        ctl.start("segunda", channel()).unwrap();

        assert_eq!(ctl.recognizer.starts, 1, "backend must not be restarted");
        // The base snapshot from the first start is still in force.
        let text = ctl.handle_event(RecognitionEvent::Result {
            segments: vec!["x".into()],
        });
        assert_eq!(text.as_deref(), Some("primera x"));
    }

    #[test]
    fn stop_is_idempotent() {
        let mut ctl = listening("");
        ctl.stop();
        ctl.stop();
        assert_eq!(ctl.state(), CaptureState::Idle);
        assert_eq!(ctl.recognizer.stops, 1);
    }

    #[test]
    fn unsupported_backend_leaves_controller_idle() {
        let mut ctl = CaptureController::new(UnsupportedRecognizer, "es-ES");
        assert_eq!(
            ctl.start("texto", channel()).unwrap_err(),
            CaptureError::Unsupported
        );
        assert_eq!(ctl.state(), CaptureState::Idle);
    }

    #[test]
    fn recognition_error_forces_idle_without_panicking() {
        let mut ctl = listening("base");
        assert!(ctl.handle_event(RecognitionEvent::Error("network".into())).is_none());
        assert_eq!(ctl.state(), CaptureState::Idle);
    }

    // ---- merge policy ---

    #[test]
    fn cumulative_updates_never_duplicate_text() {
        let mut ctl = listening("hola");

        let first = ctl.handle_event(RecognitionEvent::Result {
            segments: vec!["mundo".into()],
        });
        assert_eq!(first.as_deref(), Some("hola mundo"));

        // The engine revises: the cumulative transcript now spans two
        // segments.  A delta-appending consumer would produce
        // "hola mundo mundo feliz".
        let second = ctl.handle_event(RecognitionEvent::Result {
            segments: vec!["mundo".into(), " feliz".into()],
        });
        assert_eq!(second.as_deref(), Some("hola mundo feliz"));
    }

    #[test]
    fn interim_revision_replaces_earlier_segment() {
        let mut ctl = listening("");

        ctl.handle_event(RecognitionEvent::Result {
            segments: vec!["volaba sobre".into()],
        });
        let revised = ctl.handle_event(RecognitionEvent::Result {
            segments: vec!["volaba sobre un océano rojo".into()],
        });
        assert_eq!(revised.as_deref(), Some("volaba sobre un océano rojo"));
    }

    #[test]
    fn empty_base_gets_no_leading_space() {
        let mut ctl = listening("");
        let text = ctl.handle_event(RecognitionEvent::Result {
            segments: vec!["mundo".into()],
        });
        assert_eq!(text.as_deref(), Some("mundo"));
    }

    #[test]
    fn results_after_end_are_ignored() {
        let mut ctl = listening("hola");
        ctl.handle_event(RecognitionEvent::Ended);
        let text = ctl.handle_event(RecognitionEvent::Result {
            segments: vec!["tarde".into()],
        });
        assert!(text.is_none());
    }
}
