//! Output formatting for terminal display

use colored::{ColoredString, Colorize};

use crate::types::{DecisionLevel, ParameterSet};

impl DecisionLevel {
    /// Paint text in this level's color
    pub fn paint(&self, text: &str) -> ColoredString {
        match self {
            DecisionLevel::Micro => text.bright_black(),
            DecisionLevel::Layer => text.yellow(),
            DecisionLevel::Full => text.green().bold(),
        }
    }

    /// Get symbol for level
    pub fn symbol(&self) -> &'static str {
        match self {
            DecisionLevel::Micro => "·",
            DecisionLevel::Layer => "≈",
            DecisionLevel::Full => "♫",
        }
    }
}

impl ParameterSet {
    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let line = format!(
            "{} {} | {} | {} bpm | {} {} {} | tension={:.2} | {}",
            self.decision_level.symbol(),
            self.decision_level.as_str().to_uppercase(),
            self.intent,
            self.bpm,
            self.mode,
            self.timbre,
            self.texture,
            self.harmonic_tension,
            self.meta.reason.code(),
        );
        self.decision_level.paint(&line).to_string()
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "level={} | intent={} | bpm={} | mode={} | timbre={} | texture={} | tension={:.3} | seed={} | reason={}",
            self.decision_level,
            self.intent,
            self.bpm,
            self.mode,
            self.timbre,
            self.texture,
            self.harmonic_tension,
            self.seed,
            self.meta.reason.code(),
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
