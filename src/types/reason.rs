//! Reason codes explaining each decision level

use serde::{Deserialize, Serialize};

/// Why the mapper picked the decision level it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    // =========================================================================
    // Gating
    // =========================================================================
    /// Detector confidence under the micro threshold, fixed fallback emitted
    LowConfidence,

    // =========================================================================
    // First cycle
    // =========================================================================
    /// First parameters for this user, stress already high
    InitialStress,
    /// First parameters for this user
    InitialCycle,
    /// Previous parameters exist but the history holds a single sample
    NoHistory,

    // =========================================================================
    // Hysteresis
    // =========================================================================
    /// Large change and the intent recurred: full regeneration
    LargeDeltaWithPersistence,
    /// Large change seen once, or during cooldown
    LargeDeltaNoPersistence,
    /// Moderate change: layer update
    ModerateDelta,
    /// Negligible change
    SmallDelta,
}

impl DecisionReason {
    /// Get the code string (for logging and JSON)
    pub fn code(&self) -> &'static str {
        match self {
            Self::LowConfidence => "low_confidence",
            Self::InitialStress => "initial_stress",
            Self::InitialCycle => "initial_cycle",
            Self::NoHistory => "no_history",
            Self::LargeDeltaWithPersistence => "large_delta_with_persistence",
            Self::LargeDeltaNoPersistence => "large_delta_no_persistence",
            Self::ModerateDelta => "moderate_delta",
            Self::SmallDelta => "small_delta",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::LowConfidence => "Detector confidence too low",
            Self::InitialStress => "First cycle under stress",
            Self::InitialCycle => "First cycle",
            Self::NoHistory => "Not enough history to compare",
            Self::LargeDeltaWithPersistence => "Large shift with recurring intent",
            Self::LargeDeltaNoPersistence => "Large shift, intent not yet persistent",
            Self::ModerateDelta => "Moderate shift",
            Self::SmallDelta => "Negligible shift",
        }
    }
}

impl std::fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
