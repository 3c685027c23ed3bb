//! Moodloop: emotion signal → ambient music parameters
//!
//! Smoothing → hysteresis mapper → parameter set → (feedback) → profile learner

pub mod config;
pub mod core;
pub mod error;
pub mod types;

pub use config::{Config, EngineConfig, LearnerConfig};
pub use error::{Error, Result};

// =============================================================================
// SMOOTHING & GATING [C]
// =============================================================================

/// Number of samples averaged by the smoother
pub const SMOOTH_WINDOW: usize = 2;

/// Below this confidence the mapper emits the fixed micro fallback
pub const CONFIDENCE_MICRO: f64 = 0.45;

/// max(AU4, AU7) above this forces the calming intent
pub const STRESS_INDEX_OVERRIDE: f64 = 0.65;

/// Same intent must appear this often in the recent-intent buffer for FULL
pub const PERSISTENCE_REQUIRED: usize = 2;

/// Capacity of the recent-intent buffer
pub const INTENT_HISTORY_LEN: usize = 4;

/// Cycles blocked after a FULL decision
pub const COOLDOWN_FULL_CYCLES: u32 = 1;

// =============================================================================
// INTENT BANDS [C]
// =============================================================================

/// Valence below this with high arousal → calming
pub const CALMING_VALENCE: f64 = -0.25;

/// Valence above this with high arousal → uplifting
pub const UPLIFTING_VALENCE: f64 = 0.4;

/// Valence below this without high arousal → comforting
pub const COMFORTING_VALENCE: f64 = -0.4;

/// Arousal strictly above this counts as high
pub const HIGH_AROUSAL: f64 = 0.5;

/// Max delta above which a change is a FULL candidate
pub const DELTA_FULL_THRESHOLD: f64 = 0.25;

/// Max delta above which a change is a LAYER update
pub const DELTA_LAYER_THRESHOLD: f64 = 0.10;

// =============================================================================
// MUSICAL MAPPING [C]
// =============================================================================

/// Max BPM offset added by the seed jitter
pub const JITTER_BPM: u32 = 6;

/// Base BPM for low arousal (midpoint of 45-60)
pub const BPM_LOW: u32 = 52;
pub const BPM_MID: u32 = 60;
pub const BPM_HIGH: u32 = 78;

/// Fallback base BPM for the low-confidence path
pub const BPM_FALLBACK: u32 = 56;

/// Arousal bucket upper edges (low, mid); above mid is high
pub const AROUSAL_LOW_BAND: f64 = 0.25;
pub const AROUSAL_MID_BAND: f64 = 0.55;

/// Calming bases above the cap are averaged with the target
pub const CALMING_BPM_CAP: u32 = 70;
pub const CALMING_BPM_TARGET: u32 = 60;

/// Largest base BPM and jitter a config may set
pub const BPM_LIMIT: u32 = 300;
pub const JITTER_LIMIT: u32 = 60;

/// Timbre score weights
pub const TIMBRE_VALENCE_WEIGHT: f64 = 0.6;
pub const TIMBRE_AROUSAL_WEIGHT: f64 = 0.3;
pub const TIMBRE_STRESS_WEIGHT: f64 = 0.5;

/// Timbre score upper edges (dark, warm); above warm is bright
pub const TIMBRE_DARK_MAX: f64 = -0.3;
pub const TIMBRE_WARM_MAX: f64 = 0.1;

/// Stress or AU4 above this forces a warm timbre
pub const TIMBRE_OVERRIDE_THRESHOLD: f64 = 0.6;

/// AU12 (smile) above this with negative valence forces a warm timbre
pub const SMILE_OVERRIDE_THRESHOLD: f64 = 0.55;

/// AU7 at or above this puts percussion on the avoid list
pub const DRUM_AVOID_THRESHOLD: f64 = 0.6;

/// Texture density weights
pub const DENSITY_AROUSAL_WEIGHT: f64 = 0.7;
pub const DENSITY_INTENSITY_WEIGHT: f64 = 0.3;

/// Density upper edges (sparse, medium); above medium is rich
pub const DENSITY_SPARSE_MAX: f64 = 0.25;
pub const DENSITY_MEDIUM_MAX: f64 = 0.6;

/// |valence| at or past this picks major/minor, otherwise modal
pub const MODE_BAND: f64 = 0.2;

// =============================================================================
// REWARD & LEARNING [C]
// =============================================================================

pub const W_VALENCE: f64 = 0.6;
pub const W_AROUSAL: f64 = 0.2;
pub const W_BEHAVIOR: f64 = 0.2;

/// EMA learning rate for attribute scores
pub const ALPHA: f64 = 0.25;

pub const EPSILON_START: f64 = 0.25;
pub const EPSILON_DECAY: f64 = 0.98;
pub const EPSILON_MIN: f64 = 0.05;

/// Averaged instrument+timbre score at or below which they are banned
pub const NEGATIVE_BAN_THRESHOLD: f64 = -0.7;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
