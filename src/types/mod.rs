//! Core types for Moodloop

mod sample;
mod params;
mod reason;
mod profile;
mod reward;
mod output;

pub use sample::{EmotionSample, clamp};
pub use params::{DecisionLevel, Intent, Mode, Timbre, Texture, ParamMeta, ParameterSet};
pub use reason::DecisionReason;
pub use profile::{UserProfile, TempoBucket, ScoreKind};
pub use reward::{Behavior, RewardSignal};
