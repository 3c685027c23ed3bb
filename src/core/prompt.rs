//! Prompt renderer: parameter set → text prompt for the audio generator
//!
//! Pure templating. Banned names from the profile join the avoid list and
//! are dropped from the instrumentation line. Preferred instruments from the
//! profile lead the instrumentation line.

use std::collections::BTreeSet;

use crate::types::{Intent, ParameterSet, Texture, Timbre, UserProfile};

/// Used when every instrument is avoided
const FALLBACK_INSTRUMENT: &str = "soft ambient pad";

fn instrument_text(name: &str) -> String {
    match name {
        "warm_pad" => "warm ambient pad".to_string(),
        "soft_piano" => "soft felt piano".to_string(),
        "ethereal_pad" => "ethereal synth pad".to_string(),
        "bright_pluck" => "bright plucked synth".to_string(),
        "pad" => "soft ambient pad".to_string(),
        "soft_pluck" => "soft plucked motif".to_string(),
        "low_sub_bass" => "subtle low bass".to_string(),
        other => other.replace('_', " "),
    }
}

fn texture_text(texture: Texture) -> &'static str {
    match texture {
        Texture::Sparse => "very sparse texture, minimal melodic motion",
        Texture::Medium => "moderately textured arrangement",
        Texture::Rich => "rich layered textures with gentle movement",
    }
}

fn timbre_text(timbre: Timbre) -> &'static str {
    match timbre {
        Timbre::Dark => "dark, low-frequency-focused timbre",
        Timbre::Warm => "warm, rounded timbre with soft high-end",
        Timbre::Bright => "bright timbre with clear high-end presence",
    }
}

fn intent_guide(intent: Intent) -> &'static str {
    match intent {
        Intent::Calming => {
            "emphasize de-escalating, grounding qualities; avoid sudden attacks; slow evolution"
        }
        Intent::Comforting => "soft, comforting, slow harmonic motion; emphasize sustain",
        Intent::Uplifting => {
            "gentle uplift with positive harmonic colors and gentle rhythmic drive"
        }
        Intent::Stabilizing => "neutral, stable, unobtrusive background support",
    }
}

/// Render the generator prompt for a parameter set
pub fn render_prompt(params: &ParameterSet, profile: Option<&UserProfile>) -> String {
    let mut avoid: BTreeSet<&str> = params.avoid_instruments.iter().map(String::as_str).collect();
    let mut order: Vec<&str> = Vec::new();
    if let Some(profile) = profile {
        avoid.extend(profile.avoid.iter().map(String::as_str));
        order.extend(profile.preferred_instruments.iter().map(String::as_str));
    }
    let preferred = order.len();
    for name in &params.instruments {
        if !order[..preferred].contains(&name.as_str()) {
            order.push(name.as_str());
        }
    }

    let instruments: Vec<String> = order
        .into_iter()
        .filter(|i| !avoid.contains(i))
        .map(instrument_text)
        .collect();
    let instrumentation = if instruments.is_empty() {
        FALLBACK_INSTRUMENT.to_string()
    } else {
        instruments.join(", ")
    };

    let mut parts = vec![
        format!("{}.", intent_guide(params.intent)),
        format!(
            "Create a {} loop at {} bpm, {}.",
            params.intent,
            params.bpm,
            timbre_text(params.timbre)
        ),
        format!("{}.", texture_text(params.texture)),
        format!("Instrumentation: {}.", instrumentation),
        format!(
            "Harmonic mode: {}, harmonic tension: {:.2}.",
            params.mode, params.harmonic_tension
        ),
    ];
    if !avoid.is_empty() {
        let list: Vec<&str> = avoid.into_iter().collect();
        parts.push(format!("Avoid: {}.", list.join(", ")));
    }
    parts.push(format!("Use seed {} for reproducibility.", params.seed));

    parts.join(" ")
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DecisionLevel, DecisionReason, Mode, ParamMeta};

    fn calming_params() -> ParameterSet {
        ParameterSet {
            decision_level: DecisionLevel::Layer,
            intent: Intent::Calming,
            bpm: 58,
            mode: Mode::Modal,
            timbre: Timbre::Warm,
            texture: Texture::Sparse,
            instruments: vec!["warm_pad".to_string(), "soft_piano".to_string()],
            avoid_instruments: ["bright_synth".to_string()].into_iter().collect(),
            harmonic_tension: 0.12,
            seed: 12345,
            meta: ParamMeta {
                reason: DecisionReason::InitialCycle,
                confidence_used: 0.9,
                stress_index: Some(0.2),
            },
        }
    }

    #[test]
    fn test_full_prompt() {
        let prompt = render_prompt(&calming_params(), None);
        assert_eq!(
            prompt,
            "emphasize de-escalating, grounding qualities; avoid sudden attacks; slow evolution. \
             Create a calming loop at 58 bpm, warm, rounded timbre with soft high-end. \
             very sparse texture, minimal melodic motion. \
             Instrumentation: warm ambient pad, soft felt piano. \
             Harmonic mode: modal, harmonic tension: 0.12. \
             Avoid: bright_synth. \
             Use seed 12345 for reproducibility."
        );
    }

    #[test]
    fn test_profile_bans_drop_instruments() {
        let mut profile = UserProfile::new();
        profile.avoid.insert("soft_piano".to_string());
        let prompt = render_prompt(&calming_params(), Some(&profile));
        assert!(prompt.contains("Instrumentation: warm ambient pad."));
        assert!(prompt.contains("Avoid: bright_synth, soft_piano."));
    }

    #[test]
    fn test_all_avoided_falls_back() {
        let mut params = calming_params();
        params.avoid_instruments.insert("warm_pad".to_string());
        params.avoid_instruments.insert("soft_piano".to_string());
        let prompt = render_prompt(&params, None);
        assert!(prompt.contains("Instrumentation: soft ambient pad."));
    }

    #[test]
    fn test_unknown_instrument_text() {
        let mut params = calming_params();
        params.instruments = vec!["glass_harmonica".to_string()];
        params.avoid_instruments.clear();
        let prompt = render_prompt(&params, None);
        assert!(prompt.contains("Instrumentation: glass harmonica."));
        assert!(!prompt.contains("Avoid:"));
    }

    #[test]
    fn test_preferred_instruments_lead() {
        let mut profile = UserProfile::new();
        profile.preferred_instruments = vec!["soft_piano".to_string(), "cello".to_string()];
        let prompt = render_prompt(&calming_params(), Some(&profile));
        assert!(prompt.contains("Instrumentation: soft felt piano, cello, warm ambient pad."));

        // avoided names drop out even when preferred
        profile.avoid.insert("cello".to_string());
        let prompt = render_prompt(&calming_params(), Some(&profile));
        assert!(prompt.contains("Instrumentation: soft felt piano, warm ambient pad."));
        assert!(prompt.contains("Avoid: bright_synth, cello."));
    }
}
