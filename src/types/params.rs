//! Parameter set emitted by the decision engine

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::DecisionReason;

/// Granularity of a parameter update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionLevel {
    /// Negligible change, keep the current loop
    Micro,
    /// Partial re-parameterization
    Layer,
    /// Complete regeneration
    Full,
}

/// Musical goal for the next loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Calming,
    Comforting,
    Uplifting,
    Stabilizing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
    Modal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timbre {
    Dark,
    Warm,
    Bright,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Texture {
    Sparse,
    Medium,
    Rich,
}

macro_rules! impl_name {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Canonical lowercase name
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_name!(DecisionLevel { Micro => "micro", Layer => "layer", Full => "full" });
impl_name!(Intent {
    Calming => "calming",
    Comforting => "comforting",
    Uplifting => "uplifting",
    Stabilizing => "stabilizing",
});
impl_name!(Mode { Major => "major", Minor => "minor", Modal => "modal" });
impl_name!(Timbre { Dark => "dark", Warm => "warm", Bright => "bright" });
impl_name!(Texture { Sparse => "sparse", Medium => "medium", Rich => "rich" });

/// Diagnostics attached to every parameter set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamMeta {
    pub reason: DecisionReason,
    /// Clamped confidence of the sample that produced this set
    pub confidence_used: f64,
    /// max(AU4, AU7), rounded to 3 decimals; absent on the low-confidence path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_index: Option<f64>,
}

/// Engine output for one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub decision_level: DecisionLevel,
    pub intent: Intent,
    pub bpm: u32,
    pub mode: Mode,
    pub timbre: Timbre,
    pub texture: Texture,
    /// Catalog instruments, in priority order
    pub instruments: Vec<String>,
    pub avoid_instruments: BTreeSet<String>,
    /// 0.0..1.0, rounded to 3 decimals
    pub harmonic_tension: f64,
    pub seed: u32,
    pub meta: ParamMeta,
}

impl ParameterSet {
    /// Does this set call for a complete regeneration?
    pub fn is_full(&self) -> bool {
        self.decision_level == DecisionLevel::Full
    }
}

// =============================================================================
// TESTS
// =============================================================================
