//! Profile Learner: reward → attribute scores, bans, exploration rate
//!
//! Scores are exponential moving averages (α = 0.25) clamped to [-1, 1].
//! When the instruments and timbre of a rated loop average ≤ -0.7 they are
//! all added to the profile's avoid set. Bans do not expire;
//! `UserProfile::lift_ban` is the only way out.

use std::path::Path;

use rand::Rng;

use crate::config::LearnerConfig;
use crate::error::Result;
use crate::types::{
    clamp, Behavior, Intent, ParameterSet, RewardSignal, ScoreKind, TempoBucket, UserProfile,
};

/// Online learner for one user
#[derive(Debug, Clone)]
pub struct ProfileLearner {
    config: LearnerConfig,
    epsilon: f64,
}

impl Default for ProfileLearner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileLearner {
    /// Create learner with default config (epsilon starts at 0.25)
    pub fn new() -> Self {
        Self::with_config(LearnerConfig::default())
    }

    pub fn with_config(config: LearnerConfig) -> Self {
        let epsilon = config.epsilon_start;
        Self { config, epsilon }
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    /// Current exploration rate
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// `0.6·Δvalence + 0.2·(−Δarousal) + 0.2·behavior`, clamped to [-1, 1].
    ///
    /// Lower arousal counts as an improvement for every intent; `intent` is
    /// accepted for context only.
    pub fn compute_reward(
        &self,
        delta_valence: f64,
        delta_arousal: f64,
        behavior: Behavior,
        _intent: Intent,
    ) -> f64 {
        let dv = clamp(delta_valence, -1.0, 1.0);
        let da = clamp(delta_arousal, -1.0, 1.0);
        let reward = self.config.w_valence * dv
            + self.config.w_arousal * -da
            + self.config.w_behavior * behavior.value();
        clamp(reward, -1.0, 1.0)
    }

    /// Reward for a full feedback signal
    pub fn reward_for(&self, signal: &RewardSignal) -> f64 {
        self.compute_reward(
            signal.delta_valence,
            signal.delta_arousal,
            signal.behavior,
            signal.intent,
        )
    }

    /// Fold a reward into the profile for every attribute of `params_used`,
    /// apply the ban rule, then decay epsilon.
    pub fn update_profile(
        &mut self,
        profile: &mut UserProfile,
        params_used: &ParameterSet,
        reward: f64,
    ) {
        let reward = clamp(reward, -1.0, 1.0);

        for instrument in &params_used.instruments {
            self.blend(profile, ScoreKind::Instrument, instrument, reward);
        }
        let timbre = params_used.timbre.as_str();
        self.blend(profile, ScoreKind::Timbre, timbre, reward);
        self.blend(profile, ScoreKind::Texture, params_used.texture.as_str(), reward);
        let bucket = TempoBucket::from_bpm(params_used.bpm);
        self.blend(profile, ScoreKind::Tempo, bucket.as_str(), reward);

        let mut rated: Vec<f64> = params_used
            .instruments
            .iter()
            .map(|i| profile.score_of(ScoreKind::Instrument, i))
            .collect();
        rated.push(profile.score_of(ScoreKind::Timbre, timbre));
        let avg = rated.iter().sum::<f64>() / rated.len() as f64;

        if avg <= self.config.ban_threshold {
            let mut banned = params_used.instruments.clone();
            banned.push(timbre.to_string());
            tracing::info!(avg_score = avg, banned = ?banned, "banning attributes");
            profile.avoid.extend(banned);
        }

        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
        tracing::debug!(reward, epsilon = self.epsilon, "profile updated");
    }

    /// Compute the reward for `signal` and fold it into the profile.
    /// Returns the reward applied.
    pub fn apply_feedback(
        &mut self,
        profile: &mut UserProfile,
        params_used: &ParameterSet,
        signal: &RewardSignal,
    ) -> f64 {
        let reward = self.reward_for(signal);
        self.update_profile(profile, params_used, reward);
        reward
    }

    /// True with probability epsilon
    pub fn should_explore(&self) -> bool {
        self.should_explore_with(&mut rand::thread_rng())
    }

    /// Seedable variant of [`should_explore`](Self::should_explore)
    pub fn should_explore_with<R: Rng>(&self, rng: &mut R) -> bool {
        rng.gen::<f64>() < self.epsilon
    }

    fn blend(&self, profile: &mut UserProfile, kind: ScoreKind, name: &str, reward: f64) {
        let alpha = self.config.alpha;
        let score = profile.scores_mut(kind).entry(name.to_string()).or_insert(0.0);
        *score = clamp(*score * (1.0 - alpha) + alpha * reward, -1.0, 1.0);
    }
}

/// Write a profile as pretty JSON
pub fn save_profile(profile: &UserProfile, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(profile)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read a profile; missing score maps come back empty
pub fn load_profile(path: impl AsRef<Path>) -> Result<UserProfile> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

// =============================================================================
// TESTS
// =============================================================================
