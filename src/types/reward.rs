//! Feedback signal consumed by the profile learner

use serde::{Deserialize, Serialize};

use crate::types::Intent;

/// Discrete user behavior after a loop played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i8", into = "i8")]
pub enum Behavior {
    /// Skipped, stopped or muted
    Negative,
    Neutral,
    /// Kept listening or liked
    Positive,
}

impl Behavior {
    pub fn value(&self) -> f64 {
        match self {
            Self::Negative => -1.0,
            Self::Neutral => 0.0,
            Self::Positive => 1.0,
        }
    }
}

/// Out-of-range codes collapse to their sign
impl From<i8> for Behavior {
    fn from(code: i8) -> Self {
        match code.signum() {
            -1 => Self::Negative,
            1 => Self::Positive,
            _ => Self::Neutral,
        }
    }
}

impl From<Behavior> for i8 {
    fn from(behavior: Behavior) -> Self {
        match behavior {
            Behavior::Negative => -1,
            Behavior::Neutral => 0,
            Behavior::Positive => 1,
        }
    }
}

/// Post-hoc reward input: emotion deltas plus behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardSignal {
    /// valence_after - valence_before
    #[serde(default)]
    pub delta_valence: f64,
    /// arousal_after - arousal_before
    #[serde(default)]
    pub delta_arousal: f64,
    #[serde(default = "default_behavior")]
    pub behavior: Behavior,
    /// Intent of the loop being rated
    #[serde(default = "default_intent")]
    pub intent: Intent,
}

fn default_behavior() -> Behavior {
    Behavior::Neutral
}

fn default_intent() -> Intent {
    Intent::Calming
}

impl RewardSignal {
    pub fn new(delta_valence: f64, delta_arousal: f64, behavior: Behavior, intent: Intent) -> Self {
        Self {
            delta_valence,
            delta_arousal,
            behavior,
            intent,
        }
    }

    /// Pure behavior feedback (like/skip button) with no measured deltas
    pub fn behavior_only(behavior: Behavior, intent: Intent) -> Self {
        Self::new(0.0, 0.0, behavior, intent)
    }
}

// =============================================================================
// TESTS
// =============================================================================
