//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared freely.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// OracleConfig
// ---------------------------------------------------------------------------

/// Connection settings for the hosted AI service.
///
/// The API key is injected here at construction time; nothing in the crate
/// reads credentials from the process environment at call time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Base URL of the API endpoint.
    pub base_url: String,
    /// API key — `None` or empty disables the auth header (local emulators).
    pub api_key: Option<String>,
    /// Model used for dream interpretation (deep analysis).
    pub interpret_model: String,
    /// Model used for web-grounded symbolism lookups.
    pub search_model: String,
    /// Speech-synthesis model.
    pub tts_model: String,
    /// Prebuilt narration voice name.
    pub tts_voice: String,
    /// Imagen-style model used to generate dream imagery.
    pub image_model: String,
    /// Model used to edit an existing image from a text instruction.
    pub edit_model: String,
    /// Thinking-token budget for the interpretation call.
    pub thinking_budget: u32,
    /// Maximum seconds to wait for any oracle response.
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            api_key: None,
            interpret_model: "gemini-3-pro-preview".into(),
            search_model: "gemini-2.5-flash".into(),
            tts_model: "gemini-2.5-flash-preview-tts".into(),
            tts_voice: "Fenrir".into(),
            image_model: "imagen-4.0-generate-001".into(),
            edit_model: "gemini-2.5-flash-image".into(),
            thinking_budget: 32_768,
            timeout_secs: 120,
        }
    }
}

// ---------------------------------------------------------------------------
// NarrationConfig
// ---------------------------------------------------------------------------

/// Settings for the narration (text-to-speech playback) path.
///
/// `sample_rate` and `channels` are the speech service's fixed output
/// contract, kept in config so a contract change is a settings edit rather
/// than a code hunt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationConfig {
    /// PCM sample rate of synthesized speech in Hz.
    pub sample_rate: u32,
    /// PCM channel count of synthesized speech.
    pub channels: u16,
    /// Analyses longer than this many characters are truncated (with an
    /// ellipsis) before synthesis.
    pub max_chars: usize,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            channels: 1,
            max_chars: 1_500,
        }
    }
}

// ---------------------------------------------------------------------------
// ProgressSettings
// ---------------------------------------------------------------------------

/// Timing and shape of the simulated interpretation progress.
///
/// The simulation is a UX device, not a measurement: progress advances by a
/// bounded random amount per tick and caps below 100 until the real result
/// arrives.  The perceptual hold before revealing the result is cosmetic
/// and therefore configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSettings {
    /// Milliseconds between simulated progress ticks.
    pub tick_ms: u64,
    /// Milliseconds to hold at 100% before revealing the result.
    pub hold_ms: u64,
    /// Visible ceiling (percent) while the real call is outstanding.
    pub cap: f32,
    /// Upper bound of the random per-tick increment (percent).
    pub max_increment: f32,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            tick_ms: 600,
            hold_ms: 600,
            cap: 90.0,
            max_increment: 4.0,
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

/// Speech-capture settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Recognition locale, fixed per session.
    pub locale: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            locale: "es-ES".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use oniria::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// AI-service connection settings.
    pub oracle: OracleConfig,
    /// Narration decode/playback settings.
    pub narration: NarrationConfig,
    /// Progress-simulation timing.
    pub progress: ProgressSettings,
    /// Speech-capture settings.
    pub capture: CaptureConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns `true` when no `settings.toml` file exists yet — first-run
    /// detection used by the onboarding flow.
    pub fn is_first_run() -> bool {
        !AppPaths::new().settings_file.exists()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Verify that a default `AppConfig` can be serialised to TOML and
    /// deserialised back without any data loss.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(original, loaded);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config, AppConfig::default());
    }

    /// Verify default values match the service contracts.
    #[test]
    fn default_values_match_contracts() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.oracle.base_url, "https://generativelanguage.googleapis.com");
        assert!(cfg.oracle.api_key.is_none());
        assert_eq!(cfg.oracle.tts_voice, "Fenrir");
        assert_eq!(cfg.oracle.thinking_budget, 32_768);

        // Fixed TTS output contract — the decoder depends on these.
        assert_eq!(cfg.narration.sample_rate, 24_000);
        assert_eq!(cfg.narration.channels, 1);
        assert_eq!(cfg.narration.max_chars, 1_500);

        assert_eq!(cfg.progress.tick_ms, 600);
        assert_eq!(cfg.progress.hold_ms, 600);
        assert_eq!(cfg.progress.cap, 90.0);

        assert_eq!(cfg.capture.locale, "es-ES");
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.oracle.base_url = "http://localhost:8099".into();
        cfg.oracle.api_key = Some("test-key".into());
        cfg.oracle.interpret_model = "gemini-next".into();
        cfg.oracle.timeout_secs = 30;
        cfg.narration.max_chars = 900;
        cfg.progress.tick_ms = 250;
        cfg.progress.hold_ms = 0;
        cfg.capture.locale = "es-MX".into();

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded, cfg);
    }
}
