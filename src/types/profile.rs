//! Persistent per-user preference profile

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Tempo buckets scored by the learner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TempoBucket {
    Low,
    Mid,
    High,
}

impl TempoBucket {
    /// ≤60 low, ≤80 mid, else high
    pub fn from_bpm(bpm: u32) -> Self {
        if bpm <= 60 {
            Self::Low
        } else if bpm <= 80 {
            Self::Mid
        } else {
            Self::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Mid => "mid",
            Self::High => "high",
        }
    }
}

/// Which score map an attribute lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreKind {
    Instrument,
    Timbre,
    Texture,
    Tempo,
}

/// Learned preferences for one user. Missing maps deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub instrument_scores: BTreeMap<String, f64>,
    pub timbre_scores: BTreeMap<String, f64>,
    pub texture_scores: BTreeMap<String, f64>,
    pub tempo_scores: BTreeMap<String, f64>,
    /// Banned attribute names (instruments and timbres)
    pub avoid: BTreeSet<String>,
    /// Instruments listed first in the prompt, in this order
    pub preferred_instruments: Vec<String>,
    /// Reserved
    pub seed_bias: i64,
}

impl UserProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scores(&self, kind: ScoreKind) -> &BTreeMap<String, f64> {
        match kind {
            ScoreKind::Instrument => &self.instrument_scores,
            ScoreKind::Timbre => &self.timbre_scores,
            ScoreKind::Texture => &self.texture_scores,
            ScoreKind::Tempo => &self.tempo_scores,
        }
    }

    pub fn scores_mut(&mut self, kind: ScoreKind) -> &mut BTreeMap<String, f64> {
        match kind {
            ScoreKind::Instrument => &mut self.instrument_scores,
            ScoreKind::Timbre => &mut self.timbre_scores,
            ScoreKind::Texture => &mut self.texture_scores,
            ScoreKind::Tempo => &mut self.tempo_scores,
        }
    }

    /// Score for an attribute, 0.0 if never scored
    pub fn score_of(&self, kind: ScoreKind, name: &str) -> f64 {
        self.scores(kind).get(name).copied().unwrap_or(0.0)
    }

    pub fn is_avoided(&self, name: &str) -> bool {
        self.avoid.contains(name)
    }

    /// Remove a ban. Returns whether the name was banned.
    pub fn lift_ban(&mut self, name: &str) -> bool {
        self.avoid.remove(name)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tempo_buckets() {
        assert_eq!(TempoBucket::from_bpm(45), TempoBucket::Low);
        assert_eq!(TempoBucket::from_bpm(60), TempoBucket::Low);
        assert_eq!(TempoBucket::from_bpm(61), TempoBucket::Mid);
        assert_eq!(TempoBucket::from_bpm(80), TempoBucket::Mid);
        assert_eq!(TempoBucket::from_bpm(81), TempoBucket::High);
    }

    #[test]
    fn test_partial_profile_loads() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"instrument_scores": {"piano": 0.4}}"#).unwrap();
        assert_eq!(profile.score_of(ScoreKind::Instrument, "piano"), 0.4);
        assert!(profile.timbre_scores.is_empty());
        assert!(profile.tempo_scores.is_empty());
        assert!(profile.avoid.is_empty());
        assert!(profile.preferred_instruments.is_empty());
    }

    #[test]
    fn test_preferred_instruments_load() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"preferred_instruments": ["cello", "piano"]}"#).unwrap();
        assert_eq!(profile.preferred_instruments, vec!["cello", "piano"]);
    }

    #[test]
    fn test_lift_ban() {
        let mut profile = UserProfile::new();
        profile.avoid.insert("piano".to_string());
        assert!(profile.is_avoided("piano"));
        assert!(profile.lift_ban("piano"));
        assert!(!profile.lift_ban("piano"));
        assert!(!profile.is_avoided("piano"));
    }
}
