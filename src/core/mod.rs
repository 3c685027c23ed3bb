//! Core modules for Moodloop

pub mod seed;
pub mod smoother;
pub mod mapper;
pub mod learner;
pub mod prompt;
pub mod api;

pub use seed::{deterministic_seed, jitter_bpm};
pub use smoother::{SmoothedSignal, SmoothedState};
pub use mapper::{catalog, DecisionEngine};
pub use learner::{load_profile, save_profile, ProfileLearner};
pub use prompt::render_prompt;
pub use api::{
    create_router, run_server, AppState, LoopUpdate, SessionRegistry, SharedSession, UserSession,
};
