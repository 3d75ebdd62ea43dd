//! # oniria — dream-journal analysis core
//!
//! The engine behind a dream-interpretation journal: the user narrates a
//! dream, the dream is sent to a hosted generative-AI service ("the oracle")
//! for interpretation, narration audio and imagery, and the results are kept
//! in an in-memory session history.
//!
//! This crate is the core only — form rendering, markdown display and layout
//! belong to the embedding application, which talks to the core through the
//! [`orchestrator`] and receives [`OracleEvent`]s back over a channel.
//!
//! # Architecture
//!
//! ```text
//! UI action ──▶ Orchestrator ──▶ OracleClient (Gemini, reqwest)
//!                   │                 │
//!                   │   interpret ────┴─▶ HistoryStore (append-only)
//!                   │   narrate ─▶ decode_pcm ─▶ PlaybackController ─▶ cpal
//!                   └─▶ OracleEvent (mpsc) ─▶ UI
//!
//! CaptureController ◀── RecognitionEvent (mpsc) ◀── SpeechRecognizer
//!        └─▶ merged narrative text (read later by the orchestrator)
//! ```
//!
//! All "concurrency" is cooperative: the crate is designed to run on a
//! current-thread tokio runtime where the only suspension points are the
//! outbound service call and timer ticks, so in-process state needs no
//! locking beyond what the cpal callback thread requires.
//!
//! # Subsystems
//!
//! * [`audio`] — raw PCM decoding and single-session playback.
//! * [`capture`] — continuous interim-result speech capture with
//!   clobber-free transcript merging.
//! * [`oracle`] — the external AI-service client boundary.
//! * [`journal`] — dream/profile data model and the session history store.
//! * [`orchestrator`] — per-request lifecycle management: progress
//!   simulation, success/failure reconciliation, side-effect ordering.
//! * [`config`] — TOML-persisted settings.

pub mod audio;
pub mod capture;
pub mod config;
pub mod journal;
pub mod oracle;
pub mod orchestrator;

pub use audio::{decode_pcm, AudioBuffer, DecodeError, PlaybackController, PlaybackError};
pub use capture::{CaptureController, CaptureError, CaptureState, RecognitionEvent};
pub use config::AppConfig;
pub use journal::{DreamContext, HistoryEntry, HistoryStore, SymbolSearch, UserProfile};
pub use oracle::{GeminiClient, OracleClient, ServiceError};
pub use orchestrator::{OracleEvent, Orchestrator, OrchestratorError};
