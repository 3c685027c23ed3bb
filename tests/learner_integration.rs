//! Integration tests for the profile learner
//!
//! Tests reward folding, bans, and how bans flow back into mapping

use moodloop::core::{load_profile, render_prompt, save_profile, DecisionEngine, ProfileLearner};
use moodloop::types::{
    Behavior, EmotionSample, Intent, ParameterSet, RewardSignal, ScoreKind, UserProfile,
};
use moodloop::LearnerConfig;
use pretty_assertions::assert_eq;

/// Stabilizing sample: pad + soft_pluck, warm
fn stabilizing() -> EmotionSample {
    EmotionSample::new(0.1, 0.1)
}

fn first_params(engine: &DecisionEngine) -> ParameterSet {
    let mut state = engine.new_state("learner");
    engine.map(&stabilizing(), &mut state, None)
}

#[test]
fn test_ema_converges_by_three_quarters() {
    let engine = DecisionEngine::new();
    let params = first_params(&engine);
    let mut learner = ProfileLearner::new();
    let mut profile = UserProfile::new();
    let target = 0.6;

    let mut prev_gap = target;
    for _ in 0..20 {
        learner.update_profile(&mut profile, &params, target);
        let gap = (profile.score_of(ScoreKind::Instrument, "pad") - target).abs();
        assert!((gap - prev_gap * 0.75).abs() < 1e-9, "gap {} prev {}", gap, prev_gap);
        prev_gap = gap;
    }
}

#[test]
fn test_ban_is_permanent_until_lifted() {
    let engine = DecisionEngine::new();
    let params = first_params(&engine);
    let mut learner = ProfileLearner::new();
    let mut profile = UserProfile::new();
    let skip = RewardSignal::new(-1.0, 1.0, Behavior::Negative, Intent::Stabilizing);

    let mut rewards = Vec::new();
    while !profile.is_avoided("pad") {
        rewards.push(learner.apply_feedback(&mut profile, &params, &skip));
        assert!(rewards.len() < 10);
    }
    assert!(rewards.iter().all(|r| *r <= -0.99));
    assert!(profile.is_avoided("soft_pluck"));
    assert!(profile.is_avoided("warm"));

    let like = RewardSignal::behavior_only(Behavior::Positive, Intent::Stabilizing);
    for _ in 0..50 {
        learner.apply_feedback(&mut profile, &params, &like);
    }
    assert!(profile.is_avoided("pad"));

    assert!(profile.lift_ban("pad"));
    assert!(!profile.is_avoided("pad"));
    assert!(!profile.lift_ban("pad"));
}

#[test]
fn test_banned_instruments_flow_into_mapping() {
    let engine = DecisionEngine::new();
    let params = first_params(&engine);
    let mut learner = ProfileLearner::new();
    let mut profile = UserProfile::new();
    for _ in 0..6 {
        learner.update_profile(&mut profile, &params, -1.0);
    }

    let mut state = engine.new_state("learner");
    let next = engine.map(&stabilizing(), &mut state, Some(&profile));

    // banned picks leave the instrument list and join the avoid list
    assert!(next.instruments.is_empty());
    assert!(next.avoid_instruments.contains("pad"));
    assert!(next.avoid_instruments.contains("soft_pluck"));
    // timbre bans have no instrument score
    assert!(!next.avoid_instruments.contains("warm"));

    let prompt = render_prompt(&next, Some(&profile));
    assert!(prompt.contains("Instrumentation: soft ambient pad."));
    assert!(prompt.contains("Avoid: pad, soft_pluck, warm."));
}

#[test]
fn test_epsilon_schedule() {
    let engine = DecisionEngine::new();
    let params = first_params(&engine);
    let mut learner = ProfileLearner::with_config(LearnerConfig {
        epsilon_decay: 0.5,
        ..LearnerConfig::default()
    });
    let mut profile = UserProfile::new();

    let mut seen = Vec::new();
    for _ in 0..4 {
        learner.update_profile(&mut profile, &params, 0.0);
        seen.push(learner.epsilon());
    }
    assert_eq!(seen, vec![0.125, 0.0625, 0.05, 0.05]);
}

#[test]
fn test_profile_persists_between_runs() {
    let engine = DecisionEngine::new();
    let params = first_params(&engine);
    let mut learner = ProfileLearner::new();
    let mut profile = UserProfile::new();
    learner.update_profile(&mut profile, &params, 0.5);
    profile.avoid.insert("bright_pluck".to_string());

    let path = std::env::temp_dir().join(format!("moodloop_it_{}.json", std::process::id()));
    save_profile(&profile, &path).unwrap();
    let loaded = load_profile(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded, profile);
}

#[test]
fn test_partial_profile_json_loads() {
    let profile: UserProfile = serde_json::from_str(r#"{"avoid": ["drums"]}"#).unwrap();
    assert!(profile.is_avoided("drums"));
    assert!(profile.instrument_scores.is_empty());
}
