//! The orchestrator — sequencing of oracle calls, progress, history and
//! narration.
//!
//! [`Orchestrator`] owns the session state (history, playback) and the
//! oracle client, and exposes one async method per user-visible operation.
//! Every method takes `&mut self`, so two operations can never overlap
//! within one session; the UI observes progress through the event channel
//! instead of polling.
//!
//! ```text
//! interpret ──▶ stop narration ──▶ race: oracle call vs progress ticks
//!                                        │
//!                                        ▼
//!                       snap to 100 ──▶ hold ──▶ archive ──▶ complete
//! ```
//!
//! Failures are absorbed per operation: the orchestrator emits a
//! user-facing [`OracleEvent::Error`], restores the pre-operation state and
//! returns the underlying error to the caller.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::MissedTickBehavior;

use crate::audio::{decode_pcm, DecodeError, PlaybackController, PlaybackError};
use crate::config::AppConfig;
use crate::journal::{DreamContext, HistoryStore, SymbolSearch, UserProfile};
use crate::oracle::{OracleClient, ServiceError};

use super::progress::{ProgressSimulator, COMPLETE_STATUS, INITIAL_STATUS};

// ---------------------------------------------------------------------------
// User-facing messages (Spanish, like the rest of the session surface)
// ---------------------------------------------------------------------------

const INTERPRET_FAILED: &str = "El oráculo está nublado. Intenta de nuevo.";
const NARRATION_FAILED: &str = "No se pudo invocar la voz del oráculo.";
const IMAGE_FAILED: &str = "No se pudo materializar la imagen del sueño.";
const EDIT_FAILED: &str = "No se pudo editar la imagen del sueño.";
const SEARCH_FAILED: &str = "Error buscando símbolos.";

// ---------------------------------------------------------------------------
// OracleEvent
// ---------------------------------------------------------------------------

/// Progress and lifecycle notifications sent to the UI while an operation
/// runs.  Terminal outcomes still travel through the method's return value;
/// events exist so the interface can animate without polling.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleEvent {
    /// An interpretation began; the editor should lock.
    InterpretStarted,
    /// Simulated (or final) progress of the running interpretation.
    Progress { percent: f32, status: String },
    /// The interpretation was archived under `entry_id`.
    InterpretComplete { entry_id: String },
    /// Speech synthesis was requested.
    NarrationLoading,
    /// Narration is audible.
    NarrationStarted,
    /// Narration was stopped by the user.
    NarrationStopped,
    /// The voice produced no audio; not an error, there is just nothing to
    /// play.
    NarrationUnavailable,
    /// A user-facing failure message.
    Error { message: String },
}

// ---------------------------------------------------------------------------
// OrchestratorError
// ---------------------------------------------------------------------------

/// Any failure surfaced by an orchestrator operation.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives one dream-journal session: oracle calls, simulated progress,
/// history archiving and narration playback.
pub struct Orchestrator<C: OracleClient> {
    client: C,
    config: AppConfig,
    history: HistoryStore,
    playback: PlaybackController,
    events: UnboundedSender<OracleEvent>,
}

impl<C: OracleClient> Orchestrator<C> {
    pub fn new(
        client: C,
        playback: PlaybackController,
        config: AppConfig,
        events: UnboundedSender<OracleEvent>,
    ) -> Self {
        Self {
            client,
            config,
            history: HistoryStore::new(),
            playback,
            events,
        }
    }

    /// Session archive, newest first.
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    fn emit(&self, event: OracleEvent) {
        // The receiver may be gone during teardown; events are advisory.
        let _ = self.events.send(event);
    }

    // ---- interpretation ---

    /// Interpret a dream: race the oracle call against simulated progress
    /// ticks, hold briefly at 100%, then archive and select the result.
    ///
    /// Any narration still playing is stopped first — a voice reading the
    /// previous analysis must not continue over a new one.
    ///
    /// On failure the session is exactly as before the call: nothing is
    /// archived, the selection is unchanged, and the user-facing message is
    /// emitted as an [`OracleEvent::Error`].
    pub async fn interpret(
        &mut self,
        profile: &UserProfile,
        dream: &DreamContext,
    ) -> Result<String, OrchestratorError> {
        self.playback.stop();

        self.emit(OracleEvent::InterpretStarted);
        self.emit(OracleEvent::Progress {
            percent: 0.0,
            status: INITIAL_STATUS.to_string(),
        });

        let mut sim = ProgressSimulator::new(&self.config.progress);
        let mut rng = StdRng::from_entropy();

        let result = {
            let call = self.client.interpret_dream(profile, dream);
            tokio::pin!(call);

            let mut ticks =
                tokio::time::interval(Duration::from_millis(self.config.progress.tick_ms));
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick resolves immediately; the simulation starts
            // one full period in.
            ticks.tick().await;

            loop {
                tokio::select! {
                    result = &mut call => break result,
                    _ = ticks.tick() => {
                        let snap = sim.tick(&mut rng);
                        self.emit(OracleEvent::Progress {
                            percent: snap.percent,
                            status: snap.status.to_string(),
                        });
                    }
                }
            }
        };

        let analysis = match result {
            Ok(analysis) => analysis,
            Err(e) => {
                log::error!("interpretation failed: {e}");
                self.emit(OracleEvent::Error {
                    message: INTERPRET_FAILED.to_string(),
                });
                return Err(e.into());
            }
        };

        self.emit(OracleEvent::Progress {
            percent: 100.0,
            status: COMPLETE_STATUS.to_string(),
        });
        // Perceptual hold so the bar is seen full before the reveal.
        tokio::time::sleep(Duration::from_millis(self.config.progress.hold_ms)).await;

        let entry_id = self.history.record(dream, &analysis).id.clone();
        self.emit(OracleEvent::InterpretComplete { entry_id });

        Ok(analysis)
    }

    // ---- narration ---

    /// Synthesize and play `analysis` aloud.
    ///
    /// Returns `Ok(true)` when narration started, `Ok(false)` when the
    /// voice produced no audio (a valid outcome, not a failure).  On any
    /// error the playback session is back in idle.
    pub async fn narrate(&mut self, analysis: &str) -> Result<bool, OrchestratorError> {
        self.emit(OracleEvent::NarrationLoading);
        let text = truncate_for_narration(analysis, self.config.narration.max_chars);

        let bytes = match self.client.synthesize_speech(&text).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::warn!("speech synthesis returned no audio");
                self.emit(OracleEvent::NarrationUnavailable);
                return Ok(false);
            }
            Err(e) => {
                log::error!("speech synthesis failed: {e}");
                self.emit(OracleEvent::Error {
                    message: NARRATION_FAILED.to_string(),
                });
                return Err(e.into());
            }
        };

        let narration = &self.config.narration;
        let started = decode_pcm(&bytes, narration.sample_rate, narration.channels)
            .map_err(OrchestratorError::from)
            .and_then(|buffer| self.playback.play(buffer).map_err(OrchestratorError::from));

        match started {
            Ok(()) => {
                self.emit(OracleEvent::NarrationStarted);
                Ok(true)
            }
            Err(e) => {
                log::error!("narration playback failed: {e}");
                self.emit(OracleEvent::Error {
                    message: NARRATION_FAILED.to_string(),
                });
                Err(e)
            }
        }
    }

    /// The narration button: stop when playing, otherwise narrate.
    pub async fn toggle_narration(&mut self, analysis: &str) -> Result<bool, OrchestratorError> {
        if self.playback.is_playing() {
            self.playback.stop();
            self.emit(OracleEvent::NarrationStopped);
            Ok(false)
        } else {
            self.narrate(analysis).await
        }
    }

    // ---- imagery ---

    /// Generate a dream image, or `None` when the model produced nothing.
    pub async fn generate_image(
        &mut self,
        description: &str,
    ) -> Result<Option<Vec<u8>>, OrchestratorError> {
        match self.client.generate_image(description).await {
            Ok(image) => Ok(image),
            Err(e) => {
                log::error!("image generation failed: {e}");
                self.emit(OracleEvent::Error {
                    message: IMAGE_FAILED.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Apply an edit instruction to an existing dream image.
    pub async fn edit_image(
        &mut self,
        image: &[u8],
        instruction: &str,
    ) -> Result<Option<Vec<u8>>, OrchestratorError> {
        match self.client.edit_image(image, instruction).await {
            Ok(edited) => Ok(edited),
            Err(e) => {
                log::error!("image edit failed: {e}");
                self.emit(OracleEvent::Error {
                    message: EDIT_FAILED.to_string(),
                });
                Err(e.into())
            }
        }
    }

    // ---- symbolism search ---

    /// Web-grounded symbolism lookup.  A service failure degrades to a
    /// fallback answer with no sources — the panel always has something to
    /// show — while the failure itself is still surfaced as an event.
    pub async fn search_symbol(&mut self, query: &str) -> SymbolSearch {
        match self.client.search_symbol(query).await {
            Ok(result) => result,
            Err(e) => {
                log::error!("symbol search failed: {e}");
                self.emit(OracleEvent::Error {
                    message: SEARCH_FAILED.to_string(),
                });
                SymbolSearch {
                    text: SEARCH_FAILED.to_string(),
                    sources: Vec::new(),
                }
            }
        }
    }

    // ---- session navigation ---

    /// Load an archived analysis for replay.  Stops any running narration;
    /// `None` when `id` is unknown.
    pub fn load_history(&mut self, id: &str) -> Option<(DreamContext, String)> {
        self.playback.stop();
        self.history.select(id)
    }

    /// Start a fresh dream: stop narration, deselect history, return an
    /// empty editing context.
    pub fn new_dream(&mut self) -> DreamContext {
        self.playback.stop();
        self.history.reset()
    }
}

/// Cap `text` at `max_chars` characters (not bytes, so multi-byte Spanish
/// text can never be split mid-character), appending an ellipsis when
/// something was cut.
fn truncate_for_narration(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
