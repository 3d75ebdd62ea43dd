//! The oracle — the external AI-service boundary.
//!
//! Everything substantive (interpretation, speech, imagery, grounded
//! search) is delegated to a hosted model behind the [`OracleClient`]
//! trait.  The rest of the crate never inspects wire formats; it sees only
//! the typed results defined here and in [`crate::journal`].

pub mod client;
pub mod prompt;

pub use client::{GeminiClient, OracleClient, ServiceError};
