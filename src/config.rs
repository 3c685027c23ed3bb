//! Engine and learner configuration
//!
//! Every threshold and weight the mapper and learner use lives here so
//! tests and hosts can vary them without touching the logic. Defaults are
//! the crate-level constants.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::{
    ALPHA, AROUSAL_LOW_BAND, AROUSAL_MID_BAND, BPM_FALLBACK, BPM_HIGH, BPM_LIMIT, BPM_LOW,
    BPM_MID, CALMING_BPM_CAP, CALMING_BPM_TARGET, CALMING_VALENCE, COMFORTING_VALENCE,
    CONFIDENCE_MICRO, COOLDOWN_FULL_CYCLES, DELTA_FULL_THRESHOLD, DELTA_LAYER_THRESHOLD,
    DENSITY_AROUSAL_WEIGHT, DENSITY_INTENSITY_WEIGHT, DENSITY_MEDIUM_MAX, DENSITY_SPARSE_MAX,
    DRUM_AVOID_THRESHOLD, EPSILON_DECAY, EPSILON_MIN, EPSILON_START, HIGH_AROUSAL,
    INTENT_HISTORY_LEN, JITTER_BPM, JITTER_LIMIT, MODE_BAND, NEGATIVE_BAN_THRESHOLD,
    PERSISTENCE_REQUIRED, SMILE_OVERRIDE_THRESHOLD, SMOOTH_WINDOW, STRESS_INDEX_OVERRIDE,
    TIMBRE_AROUSAL_WEIGHT, TIMBRE_DARK_MAX, TIMBRE_OVERRIDE_THRESHOLD, TIMBRE_STRESS_WEIGHT,
    TIMBRE_VALENCE_WEIGHT, TIMBRE_WARM_MAX, UPLIFTING_VALENCE, W_AROUSAL, W_BEHAVIOR, W_VALENCE,
};

/// Tunables for smoothing and the decision engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub smooth_window: usize,
    pub confidence_micro: f64,
    pub stress_index_override: f64,
    pub persistence_required: usize,
    pub intent_history_len: usize,
    pub cooldown_full_cycles: u32,
    pub delta_full_threshold: f64,
    pub delta_layer_threshold: f64,

    // Intent bands
    pub calming_valence: f64,
    pub uplifting_valence: f64,
    pub comforting_valence: f64,
    pub high_arousal: f64,

    // Tempo
    pub jitter_bpm: u32,
    pub bpm_low: u32,
    pub bpm_mid: u32,
    pub bpm_high: u32,
    pub bpm_fallback: u32,
    pub arousal_low_band: f64,
    pub arousal_mid_band: f64,
    pub calming_bpm_cap: u32,
    pub calming_bpm_target: u32,

    // Timbre
    pub timbre_valence_weight: f64,
    pub timbre_arousal_weight: f64,
    pub timbre_stress_weight: f64,
    pub timbre_dark_max: f64,
    pub timbre_warm_max: f64,
    pub timbre_override_threshold: f64,
    pub smile_override_threshold: f64,

    pub drum_avoid_threshold: f64,

    // Texture and harmony
    pub density_arousal_weight: f64,
    pub density_intensity_weight: f64,
    pub density_sparse_max: f64,
    pub density_medium_max: f64,
    pub mode_band: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            smooth_window: SMOOTH_WINDOW,
            confidence_micro: CONFIDENCE_MICRO,
            stress_index_override: STRESS_INDEX_OVERRIDE,
            persistence_required: PERSISTENCE_REQUIRED,
            intent_history_len: INTENT_HISTORY_LEN,
            cooldown_full_cycles: COOLDOWN_FULL_CYCLES,
            delta_full_threshold: DELTA_FULL_THRESHOLD,
            delta_layer_threshold: DELTA_LAYER_THRESHOLD,
            calming_valence: CALMING_VALENCE,
            uplifting_valence: UPLIFTING_VALENCE,
            comforting_valence: COMFORTING_VALENCE,
            high_arousal: HIGH_AROUSAL,
            jitter_bpm: JITTER_BPM,
            bpm_low: BPM_LOW,
            bpm_mid: BPM_MID,
            bpm_high: BPM_HIGH,
            bpm_fallback: BPM_FALLBACK,
            arousal_low_band: AROUSAL_LOW_BAND,
            arousal_mid_band: AROUSAL_MID_BAND,
            calming_bpm_cap: CALMING_BPM_CAP,
            calming_bpm_target: CALMING_BPM_TARGET,
            timbre_valence_weight: TIMBRE_VALENCE_WEIGHT,
            timbre_arousal_weight: TIMBRE_AROUSAL_WEIGHT,
            timbre_stress_weight: TIMBRE_STRESS_WEIGHT,
            timbre_dark_max: TIMBRE_DARK_MAX,
            timbre_warm_max: TIMBRE_WARM_MAX,
            timbre_override_threshold: TIMBRE_OVERRIDE_THRESHOLD,
            smile_override_threshold: SMILE_OVERRIDE_THRESHOLD,
            drum_avoid_threshold: DRUM_AVOID_THRESHOLD,
            density_arousal_weight: DENSITY_AROUSAL_WEIGHT,
            density_intensity_weight: DENSITY_INTENSITY_WEIGHT,
            density_sparse_max: DENSITY_SPARSE_MAX,
            density_medium_max: DENSITY_MEDIUM_MAX,
            mode_band: MODE_BAND,
        }
    }
}

/// Tunables for reward computation and profile updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    pub w_valence: f64,
    pub w_arousal: f64,
    pub w_behavior: f64,
    pub alpha: f64,
    pub epsilon_start: f64,
    pub epsilon_decay: f64,
    pub epsilon_min: f64,
    pub ban_threshold: f64,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            w_valence: W_VALENCE,
            w_arousal: W_AROUSAL,
            w_behavior: W_BEHAVIOR,
            alpha: ALPHA,
            epsilon_start: EPSILON_START,
            epsilon_decay: EPSILON_DECAY,
            epsilon_min: EPSILON_MIN,
            ban_threshold: NEGATIVE_BAN_THRESHOLD,
        }
    }
}

/// Full runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub learner: LearnerConfig,
}

impl Config {
    /// Parse a JSON config; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&content)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded config");
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let e = &self.engine;
        if e.smooth_window == 0 {
            return Err(Error::invalid_config("engine.smooth_window must be >= 1"));
        }
        if e.intent_history_len == 0 {
            return Err(Error::invalid_config("engine.intent_history_len must be >= 1"));
        }
        if e.persistence_required == 0 {
            return Err(Error::invalid_config("engine.persistence_required must be >= 1"));
        }
        if e.delta_layer_threshold > e.delta_full_threshold {
            return Err(Error::invalid_config(
                "engine.delta_layer_threshold must not exceed engine.delta_full_threshold",
            ));
        }
        let bases = [
            ("bpm_low", e.bpm_low),
            ("bpm_mid", e.bpm_mid),
            ("bpm_high", e.bpm_high),
            ("bpm_fallback", e.bpm_fallback),
            ("calming_bpm_cap", e.calming_bpm_cap),
            ("calming_bpm_target", e.calming_bpm_target),
        ];
        for (name, bpm) in bases {
            if bpm == 0 || bpm > BPM_LIMIT {
                return Err(Error::invalid_config(format!(
                    "engine.{} must be in 1..={}, got {}",
                    name, BPM_LIMIT, bpm
                )));
            }
        }
        if e.jitter_bpm > JITTER_LIMIT {
            return Err(Error::invalid_config(format!(
                "engine.jitter_bpm must be <= {}, got {}",
                JITTER_LIMIT, e.jitter_bpm
            )));
        }
        if e.arousal_low_band > e.arousal_mid_band
            || e.timbre_dark_max > e.timbre_warm_max
            || e.density_sparse_max > e.density_medium_max
        {
            return Err(Error::invalid_config(
                "engine band edges must be ordered low <= high",
            ));
        }

        let l = &self.learner;
        if !(l.alpha > 0.0 && l.alpha <= 1.0) {
            return Err(Error::invalid_config("learner.alpha must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&l.epsilon_min) || !(0.0..=1.0).contains(&l.epsilon_start) {
            return Err(Error::invalid_config("learner epsilon values must be in [0, 1]"));
        }
        if l.epsilon_min > l.epsilon_start {
            return Err(Error::invalid_config(
                "learner.epsilon_min must not exceed learner.epsilon_start",
            ));
        }
        if !(0.0..=1.0).contains(&l.epsilon_decay) {
            return Err(Error::invalid_config("learner.epsilon_decay must be in [0, 1]"));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = Config::default();
        assert_eq!(config.engine.smooth_window, 2);
        assert_eq!(config.engine.confidence_micro, 0.45);
        assert_eq!(config.learner.alpha, 0.25);
        assert_eq!(config.learner.ban_threshold, -0.7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{"engine": {"smooth_window": 4}}"#).unwrap();
        assert_eq!(config.engine.smooth_window, 4);
        assert_eq!(config.engine.delta_full_threshold, DELTA_FULL_THRESHOLD);
        assert_eq!(config.learner, LearnerConfig::default());
    }

    #[test]
    fn test_zero_window_rejected() {
        let err = Config::from_json(r#"{"engine": {"smooth_window": 0}}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_bad_alpha_rejected() {
        let err = Config::from_json(r#"{"learner": {"alpha": 1.5}}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = Config::from_json("{ nope").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_huge_bpm_rejected() {
        let err = Config::from_json(r#"{"engine": {"bpm_fallback": 4294967295}}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));

        let err = Config::from_json(r#"{"engine": {"bpm_high": 301}}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));

        let err = Config::from_json(r#"{"engine": {"bpm_low": 0}}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));

        let err = Config::from_json(r#"{"engine": {"jitter_bpm": 61}}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));

        let config = Config::from_json(r#"{"engine": {"bpm_high": 300, "jitter_bpm": 60}}"#);
        assert!(config.is_ok());
    }

    #[test]
    fn test_unordered_bands_rejected() {
        let err = Config::from_json(r#"{"engine": {"arousal_low_band": 0.9}}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_band_defaults() {
        let engine = EngineConfig::default();
        assert_eq!(engine.high_arousal, 0.5);
        assert_eq!(engine.calming_bpm_cap, 70);
        assert_eq!(engine.mode_band, 0.2);
    }
}
