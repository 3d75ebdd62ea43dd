//! Single-session playback controller.
//!
//! [`PlaybackController`] owns at most one active playback at a time and
//! enforces the ordering guarantees the rest of the crate relies on:
//!
//! * starting a new buffer always stops the previous source first — two
//!   concurrent sources are impossible;
//! * `stop()` takes effect before it returns, never "eventually";
//! * a source that ends naturally transitions the controller back to idle,
//!   and a *stale* end callback (from a source that was already superseded)
//!   can never clobber the state of its successor.
//!
//! The state machine:
//!
//! ```text
//! Idle ──play──▶ Loading ──sink ok──▶ Playing ──natural end──▶ Idle
//!                   │                    │
//!                   └──sink error──▶ Idle└──stop()──▶ Idle
//! ```

use std::sync::{Arc, Mutex};

use super::sink::{AudioSink, PlaybackError};
use super::AudioBuffer;

// ---------------------------------------------------------------------------
// PlaybackState
// ---------------------------------------------------------------------------

/// Observable states of the playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No source active.
    Idle,
    /// A source is being handed to the sink.
    Loading,
    /// Audio is audible.
    Playing,
}

/// Generation-stamped state shared with end callbacks.
///
/// The generation increments on every `play` and `stop`, so an end callback
/// minted for generation N is a no-op once generation N+1 exists.
struct Shared {
    state: PlaybackState,
    generation: u64,
}

// ---------------------------------------------------------------------------
// PlaybackController
// ---------------------------------------------------------------------------

/// Owns the one live playback session.
///
/// The UI-facing entry point is [`toggle`]; [`play`] and [`stop`] exist for
/// the orchestrator, which needs the stronger "always restart" semantics
/// when a new narration supersedes the old one.
///
/// Dropping the controller stops the sink, so playback is released on every
/// teardown path including abnormal ones.
///
/// [`toggle`]: PlaybackController::toggle
/// [`play`]: PlaybackController::play
/// [`stop`]: PlaybackController::stop
pub struct PlaybackController {
    sink: Box<dyn AudioSink>,
    shared: Arc<Mutex<Shared>>,
}

impl PlaybackController {
    pub fn new(sink: Box<dyn AudioSink>) -> Self {
        Self {
            sink,
            shared: Arc::new(Mutex::new(Shared {
                state: PlaybackState::Idle,
                generation: 0,
            })),
        }
    }

    /// Controller backed by the system default output device.
    pub fn with_default_output() -> Self {
        Self::new(Box::new(super::sink::CpalSink::new()))
    }

    /// Current state (copy).
    pub fn state(&self) -> PlaybackState {
        self.shared.lock().unwrap().state
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    /// Start playing `buffer`, stopping any prior source first.
    ///
    /// # Errors
    ///
    /// [`PlaybackError`] when the sink cannot acquire or drive the output
    /// device; the controller is back in `Idle` when this returns.
    pub fn play(&mut self, buffer: AudioBuffer) -> Result<(), PlaybackError> {
        self.stop();

        let generation = {
            let mut sh = self.shared.lock().unwrap();
            sh.generation += 1;
            sh.state = PlaybackState::Loading;
            sh.generation
        };

        let shared = Arc::clone(&self.shared);
        let on_end = Box::new(move || {
            let mut sh = shared.lock().unwrap();
            if sh.generation == generation {
                sh.state = PlaybackState::Idle;
            }
        });

        match self.sink.start(buffer, on_end) {
            Ok(()) => {
                let mut sh = self.shared.lock().unwrap();
                // The end callback may already have fired for a zero-length
                // buffer; only promote if this generation is still loading.
                if sh.generation == generation && sh.state == PlaybackState::Loading {
                    sh.state = PlaybackState::Playing;
                }
                Ok(())
            }
            Err(e) => {
                let mut sh = self.shared.lock().unwrap();
                if sh.generation == generation {
                    sh.state = PlaybackState::Idle;
                }
                Err(e)
            }
        }
    }

    /// Halt output immediately.  Idempotent; a no-op when nothing plays.
    pub fn stop(&mut self) {
        self.sink.stop();
        let mut sh = self.shared.lock().unwrap();
        sh.generation += 1;
        sh.state = PlaybackState::Idle;
    }

    /// The UI entry point: stop when playing, otherwise start `buffer`.
    pub fn toggle(&mut self, buffer: AudioBuffer) -> Result<(), PlaybackError> {
        if self.is_playing() {
            self.stop();
            Ok(())
        } else {
            self.play(buffer)
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.sink.stop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::super::sink::EndCallback;
    use super::*;

    fn tone(frames: usize) -> AudioBuffer {
        AudioBuffer::from_channels(24_000, vec![vec![0.1; frames]])
    }

    /// Test sink that records lifecycle calls and hands the end callbacks
    /// back to the test so natural completion can be simulated.
    #[derive(Default)]
    struct MockSinkState {
        active_sources: usize,
        started: usize,
        pending_ends: Vec<EndCallback>,
        fail_next: bool,
    }

    #[derive(Clone, Default)]
    struct MockSink(Arc<Mutex<MockSinkState>>);

    impl MockSink {
        fn active(&self) -> usize {
            self.0.lock().unwrap().active_sources
        }

        fn started(&self) -> usize {
            self.0.lock().unwrap().started
        }

        fn fail_next(&self) {
            self.0.lock().unwrap().fail_next = true;
        }

        /// Fire the oldest pending end callback, as the audio thread would
        /// when the source runs out of samples.
        fn finish_oldest(&self) {
            let cb = {
                let mut st = self.0.lock().unwrap();
                st.active_sources = st.active_sources.saturating_sub(1);
                st.pending_ends.remove(0)
            };
            cb();
        }
    }

    impl AudioSink for MockSink {
        fn start(&mut self, _buffer: AudioBuffer, on_end: EndCallback) -> Result<(), PlaybackError> {
            let mut st = self.0.lock().unwrap();
            if st.fail_next {
                st.fail_next = false;
                return Err(PlaybackError::NoDevice);
            }
            st.active_sources += 1;
            st.started += 1;
            st.pending_ends.push(on_end);
            Ok(())
        }

        fn stop(&mut self) {
            let mut st = self.0.lock().unwrap();
            st.active_sources = 0;
            // Explicit stop discards the callbacks — the controller drives
            // its own state on stop.
            st.pending_ends.clear();
        }
    }

    fn controller() -> (PlaybackController, MockSink) {
        let sink = MockSink::default();
        (PlaybackController::new(Box::new(sink.clone())), sink)
    }

    // ---- state machine ---

    #[test]
    fn starts_idle() {
        let (ctl, _) = controller();
        assert_eq!(ctl.state(), PlaybackState::Idle);
    }

    #[test]
    fn play_transitions_to_playing() {
        let (mut ctl, sink) = controller();
        ctl.play(tone(100)).unwrap();
        assert_eq!(ctl.state(), PlaybackState::Playing);
        assert_eq!(sink.active(), 1);
    }

    #[test]
    fn natural_end_returns_to_idle() {
        let (mut ctl, sink) = controller();
        ctl.play(tone(100)).unwrap();
        sink.finish_oldest();
        assert_eq!(ctl.state(), PlaybackState::Idle);
    }

    #[test]
    fn stop_is_idempotent() {
        let (mut ctl, _) = controller();
        ctl.stop();
        ctl.stop();
        assert_eq!(ctl.state(), PlaybackState::Idle);
    }

    #[test]
    fn sink_failure_rolls_back_to_idle() {
        let (mut ctl, sink) = controller();
        sink.fail_next();
        assert!(ctl.play(tone(100)).is_err());
        assert_eq!(ctl.state(), PlaybackState::Idle);
        assert_eq!(sink.active(), 0);
    }

    // ---- mutual exclusion ---

    #[test]
    fn play_a_then_play_b_leaves_exactly_one_source() {
        let (mut ctl, sink) = controller();
        ctl.play(tone(100)).unwrap();
        ctl.play(tone(200)).unwrap();

        assert_eq!(sink.started(), 2);
        assert_eq!(sink.active(), 1, "the superseded source must be stopped");
        assert_eq!(ctl.state(), PlaybackState::Playing);
    }

    #[test]
    fn stale_end_callback_cannot_clobber_successor() {
        let (mut ctl, sink) = controller();
        ctl.play(tone(100)).unwrap();

        // Capture A's end callback before B replaces it.
        let stale = sink.0.lock().unwrap().pending_ends.remove(0);

        ctl.play(tone(200)).unwrap();
        stale();

        assert_eq!(
            ctl.state(),
            PlaybackState::Playing,
            "A's late completion must not stop B"
        );
    }

    // ---- toggle ---

    #[test]
    fn toggle_starts_when_idle_and_stops_when_playing() {
        let (mut ctl, sink) = controller();

        ctl.toggle(tone(100)).unwrap();
        assert_eq!(ctl.state(), PlaybackState::Playing);

        ctl.toggle(tone(100)).unwrap();
        assert_eq!(ctl.state(), PlaybackState::Idle);
        assert_eq!(sink.active(), 0);
        assert_eq!(sink.started(), 1, "the second toggle must stop, not restart");
    }
}
