//! Decision Engine: emotion sample → music parameter set
//!
//! Pipeline per cycle (fixed order):
//! 1. clamp + push into the smoother
//! 2. confidence gate (fixed MICRO fallback)
//! 3. intent → bpm → timbre → texture → instruments → harmony
//! 4. decision-level hysteresis
//!
//! Hysteresis:
//! - first parameters for a user → LAYER
//! - max delta > 0.25, no cooldown, intent recurring ≥ 2× in buffer → FULL
//! - max delta > 0.25 otherwise → LAYER
//! - max delta > 0.10 → LAYER
//! - else → MICRO

use std::collections::BTreeSet;

use crate::config::EngineConfig;
use crate::core::seed::{deterministic_seed, jitter_bpm};
use crate::core::smoother::{SmoothedSignal, SmoothedState};
use crate::types::{
    clamp, DecisionLevel, DecisionReason, EmotionSample, Intent, Mode, ParamMeta, ParameterSet,
    ScoreKind, Texture, Timbre, UserProfile,
};

/// Catalog pick and always-avoid list for an intent
pub fn catalog(intent: Intent) -> (&'static [&'static str], &'static [&'static str]) {
    match intent {
        Intent::Calming => (&["warm_pad", "soft_piano"], &["bright_synth", "aggressive_drums"]),
        Intent::Comforting => (&["piano", "ethereal_pad"], &["bright_synth"]),
        Intent::Uplifting => (&["bright_pluck", "warm_pad"], &[]),
        Intent::Stabilizing => (&["pad", "soft_pluck"], &[]),
    }
}

/// Percussion added to the avoid list when AU7 (lid tightener) is high
const TENSE_AVOID: [&str; 2] = ["drums", "aggressive_drums"];

/// Deterministic mapping engine. Holds only configuration; all per-user
/// state lives in [`SmoothedState`].
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    config: EngineConfig,
}

impl DecisionEngine {
    /// Create engine with default config
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fresh per-user state sized by this engine's config
    pub fn new_state(&self, user_id: impl Into<String>) -> SmoothedState {
        let cfg = &self.config;
        SmoothedState::with_capacity(user_id, cfg.smooth_window, cfg.intent_history_len)
    }

    /// Map one sample to a parameter set, mutating the user's state.
    ///
    /// Instruments the profile has banned are dropped from the catalog pick
    /// and merged into `avoid_instruments`.
    pub fn map(
        &self,
        sample: &EmotionSample,
        state: &mut SmoothedState,
        profile: Option<&UserProfile>,
    ) -> ParameterSet {
        let cfg = &self.config;
        let sample = sample.clamped();

        state.push(&sample);
        let sm = state.smoothed();
        let seed = deterministic_seed(state.user_id(), state.cycle_index());

        if sample.confidence < cfg.confidence_micro {
            tracing::warn!(
                user = state.user_id(),
                cycle = state.cycle_index(),
                confidence = sample.confidence,
                "low confidence sample, emitting fallback"
            );
            let params = self.fallback(seed, sample.confidence);
            state.last_params = Some(params.clone());
            return params;
        }

        // Smoothed AU first, raw sample when the window never saw it
        let au = |name: &str| sm.aus.get(name).copied().unwrap_or_else(|| sample.au(name));
        let au4 = au("AU4");
        let au7 = au("AU7");
        let au12 = au("AU12");
        let stress_index = au4.max(au7);

        let intent = self.classify_intent(&sm, stress_index);
        let bpm = jitter_bpm(self.base_bpm(sm.arousal, intent), seed, cfg.jitter_bpm);
        let timbre = self.timbre(&sm, stress_index, au4, au12);
        let texture = self.texture(&sm, intent);

        let (picks, always_avoid) = catalog(intent);
        let mut instruments: Vec<String> = picks.iter().map(|s| s.to_string()).collect();
        let mut avoid_instruments: BTreeSet<String> =
            always_avoid.iter().map(|s| s.to_string()).collect();
        if au7 >= cfg.drum_avoid_threshold {
            avoid_instruments.extend(TENSE_AVOID.iter().map(|s| s.to_string()));
        }
        if let Some(profile) = profile {
            instruments.retain(|name| !profile.is_avoided(name));
            avoid_instruments.extend(banned_instruments(profile));
        }

        let mode = if sm.valence >= cfg.mode_band {
            Mode::Major
        } else if sm.valence <= -cfg.mode_band {
            Mode::Minor
        } else {
            Mode::Modal
        };
        let harmonic_tension = clamp((1.0 - sm.valence) * sm.intensity, 0.0, 1.0);

        let (decision_level, reason) = self.decide_level(state, &sm, intent, stress_index);

        let params = ParameterSet {
            decision_level,
            intent,
            bpm,
            mode,
            timbre,
            texture,
            instruments,
            avoid_instruments,
            harmonic_tension: round3(harmonic_tension),
            seed,
            meta: ParamMeta {
                reason,
                confidence_used: sample.confidence,
                stress_index: Some(round3(stress_index)),
            },
        };

        if decision_level == DecisionLevel::Full {
            tracing::info!(
                user = state.user_id(),
                cycle = state.cycle_index(),
                intent = %intent,
                "full regeneration"
            );
        } else {
            tracing::debug!(
                user = state.user_id(),
                cycle = state.cycle_index(),
                level = %decision_level,
                reason = reason.code(),
                "mapped sample"
            );
        }

        state.last_params = Some(params.clone());
        params
    }

    /// Fixed parameters for samples the detector is unsure about
    fn fallback(&self, seed: u32, confidence: f64) -> ParameterSet {
        ParameterSet {
            decision_level: DecisionLevel::Micro,
            intent: Intent::Stabilizing,
            bpm: jitter_bpm(self.config.bpm_fallback, seed, self.config.jitter_bpm),
            mode: Mode::Modal,
            timbre: Timbre::Warm,
            texture: Texture::Sparse,
            instruments: vec!["warm_pad".to_string()],
            avoid_instruments: BTreeSet::new(),
            harmonic_tension: 0.1,
            seed,
            meta: ParamMeta {
                reason: DecisionReason::LowConfidence,
                confidence_used: confidence,
                stress_index: None,
            },
        }
    }

    /// Strict priority: calming > uplifting > comforting > stabilizing
    fn classify_intent(&self, sm: &SmoothedSignal, stress_index: f64) -> Intent {
        let cfg = &self.config;
        if stress_index > cfg.stress_index_override
            || (sm.valence < cfg.calming_valence && sm.arousal > cfg.high_arousal)
        {
            Intent::Calming
        } else if sm.valence > cfg.uplifting_valence && sm.arousal > cfg.high_arousal {
            Intent::Uplifting
        } else if sm.valence < cfg.comforting_valence && sm.arousal <= cfg.high_arousal {
            Intent::Comforting
        } else {
            Intent::Stabilizing
        }
    }

    fn base_bpm(&self, arousal: f64, intent: Intent) -> u32 {
        let cfg = &self.config;
        let base = if arousal <= cfg.arousal_low_band {
            cfg.bpm_low
        } else if arousal <= cfg.arousal_mid_band {
            cfg.bpm_mid
        } else {
            cfg.bpm_high
        };
        if intent == Intent::Calming && base > cfg.calming_bpm_cap {
            base.saturating_add(cfg.calming_bpm_target) / 2
        } else {
            base
        }
    }

    fn timbre(&self, sm: &SmoothedSignal, stress_index: f64, au4: f64, au12: f64) -> Timbre {
        let cfg = &self.config;
        let score = sm.valence * cfg.timbre_valence_weight
            - sm.arousal * cfg.timbre_arousal_weight
            - stress_index * cfg.timbre_stress_weight;
        let timbre = if score <= cfg.timbre_dark_max {
            Timbre::Dark
        } else if score <= cfg.timbre_warm_max {
            Timbre::Warm
        } else {
            Timbre::Bright
        };

        let tense =
            stress_index > cfg.timbre_override_threshold || au4 > cfg.timbre_override_threshold;
        let masked_smile = au12 > cfg.smile_override_threshold && sm.valence < 0.0;
        if tense || masked_smile {
            Timbre::Warm
        } else {
            timbre
        }
    }

    fn texture(&self, sm: &SmoothedSignal, intent: Intent) -> Texture {
        let cfg = &self.config;
        let density =
            sm.arousal * cfg.density_arousal_weight + sm.intensity * cfg.density_intensity_weight;
        let texture = if density <= cfg.density_sparse_max {
            Texture::Sparse
        } else if density <= cfg.density_medium_max {
            Texture::Medium
        } else {
            Texture::Rich
        };
        if intent == Intent::Calming && texture == Texture::Rich {
            Texture::Medium
        } else {
            texture
        }
    }

    /// Hysteresis gate. Only the large-delta branch touches the intent buffer
    /// and cooldown.
    fn decide_level(
        &self,
        state: &mut SmoothedState,
        sm: &SmoothedSignal,
        intent: Intent,
        stress_index: f64,
    ) -> (DecisionLevel, DecisionReason) {
        let cfg = &self.config;

        if state.last_params.is_none() {
            let reason = if stress_index > cfg.stress_index_override {
                DecisionReason::InitialStress
            } else {
                DecisionReason::InitialCycle
            };
            return (DecisionLevel::Layer, reason);
        }

        let Some((prev_valence, prev_arousal)) = state.previous_raw() else {
            return (DecisionLevel::Micro, DecisionReason::NoHistory);
        };

        let max_delta = (sm.valence - prev_valence).abs().max((sm.arousal - prev_arousal).abs());

        if max_delta > cfg.delta_full_threshold && state.cooldown == 0 {
            state.record_intent(intent);
            if state.intent_count(intent) >= cfg.persistence_required {
                state.cooldown = cfg.cooldown_full_cycles;
                (DecisionLevel::Full, DecisionReason::LargeDeltaWithPersistence)
            } else {
                (DecisionLevel::Layer, DecisionReason::LargeDeltaNoPersistence)
            }
        } else if max_delta > cfg.delta_layer_threshold {
            (DecisionLevel::Layer, DecisionReason::ModerateDelta)
        } else {
            (DecisionLevel::Micro, DecisionReason::SmallDelta)
        }
    }
}

/// Banned names the profile has scored as instruments
fn banned_instruments(profile: &UserProfile) -> impl Iterator<Item = String> + '_ {
    profile
        .avoid
        .iter()
        .filter(|name| profile.scores(ScoreKind::Instrument).contains_key(name.as_str()))
        .cloned()
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

// =============================================================================
// TESTS
// =============================================================================
