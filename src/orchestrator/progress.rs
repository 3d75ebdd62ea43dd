//! Simulated interpretation progress.
//!
//! The oracle gives no progress signal, so the journal fakes one: a fixed
//! tick advances a percentage by a bounded random amount, visibly capped
//! below 100 until the real response lands (the final stretch is reserved
//! for confirmed completion).  The current percentage maps onto six mystic
//! status phrases by linear bucketing.
//!
//! [`ProgressSimulator`] is pure state — no timers, no randomness of its
//! own — so tests drive ticks with a seeded RNG and assert the exact
//! trajectory.  The orchestrator supplies the real clock.

use rand::Rng;

use crate::config::ProgressSettings;

/// Shown before the first tick.
pub const INITIAL_STATUS: &str = "Iniciando conexión onírica...";

/// Shown when the real result has arrived and progress snaps to 100.
pub const COMPLETE_STATUS: &str = "Revelación concedida.";

/// The six phases of the simulated journey, in bucket order.
pub const STATUS_PHRASES: [&str; 6] = [
    "Sintonizando frecuencia cerebral...",
    "Navegando el mar del subconsciente...",
    "Decodificando símbolos ancestrales...",
    "Consultando a los arquetipos universales...",
    "Tejiendo la profecía...",
    "Materializando la revelación...",
];

/// One observable step of the simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    /// Percentage in `[0, 100]`; never decreases.
    pub percent: f32,
    /// Status phrase for this percentage.
    pub status: &'static str,
}

// ---------------------------------------------------------------------------
// ProgressSimulator
// ---------------------------------------------------------------------------

/// Monotonically non-decreasing fake progress with a visible ceiling.
#[derive(Debug)]
pub struct ProgressSimulator {
    percent: f32,
    cap: f32,
    max_increment: f32,
}

impl ProgressSimulator {
    pub fn new(settings: &ProgressSettings) -> Self {
        Self {
            percent: 0.0,
            cap: settings.cap,
            max_increment: settings.max_increment,
        }
    }

    pub fn percent(&self) -> f32 {
        self.percent
    }

    /// Advance by a random amount in `[0, max_increment)`, clamped to the
    /// cap, and return the new snapshot.
    pub fn tick(&mut self, rng: &mut impl Rng) -> ProgressSnapshot {
        let increment = rng.gen::<f32>() * self.max_increment;
        self.percent = (self.percent + increment).min(self.cap);
        ProgressSnapshot {
            percent: self.percent,
            status: self.status(),
        }
    }

    /// The real result arrived: snap to 100.
    pub fn complete(&mut self) -> ProgressSnapshot {
        self.percent = 100.0;
        ProgressSnapshot {
            percent: 100.0,
            status: COMPLETE_STATUS,
        }
    }

    /// Linear bucketing of `percent / cap` onto the phrase list, clamped to
    /// the last phrase.
    fn status(&self) -> &'static str {
        let n = STATUS_PHRASES.len();
        let index = ((self.percent / self.cap) * n as f32).floor() as usize;
        STATUS_PHRASES[index.min(n - 1)]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
