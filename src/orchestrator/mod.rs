//! Async session orchestration.
//!
//! Splits in two: [`progress`] is the pure simulated-progress state machine,
//! [`runner`] is the [`Orchestrator`] that races oracle calls against the
//! progress clock and routes results into history and narration.

pub mod progress;
pub mod runner;

pub use progress::{ProgressSimulator, ProgressSnapshot};
pub use runner::{OracleEvent, Orchestrator, OrchestratorError};
