//! Signal smoother: per-user bounded history of recent samples
//!
//! Each user owns one `SmoothedState`. Histories are FIFO rings of fixed
//! capacity (the smoothing window); the oldest sample is evicted once full.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::types::{EmotionSample, Intent, ParameterSet};
use crate::{INTENT_HISTORY_LEN, SMOOTH_WINDOW};

/// Windowed means over the current history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothedSignal {
    pub valence: f64,
    pub arousal: f64,
    pub intensity: f64,
    /// Mean per AU over the union of keys in the window
    pub aus: BTreeMap<String, f64>,
}

/// Per-user engine state
#[derive(Debug, Clone)]
pub struct SmoothedState {
    user_id: String,
    window: usize,
    valence_hist: VecDeque<f64>,
    arousal_hist: VecDeque<f64>,
    intensity_hist: VecDeque<f64>,
    aus_hist: VecDeque<BTreeMap<String, f64>>,
    intent_capacity: usize,
    pub(crate) cycle_index: u64,
    pub(crate) cooldown: u32,
    pub(crate) intent_history: VecDeque<Intent>,
    pub(crate) last_params: Option<ParameterSet>,
}

impl SmoothedState {
    /// Create state with the default window (2) and intent buffer (4)
    pub fn new(user_id: impl Into<String>) -> Self {
        Self::with_capacity(user_id, SMOOTH_WINDOW, INTENT_HISTORY_LEN)
    }

    /// Create state with custom capacities (both clamped to at least 1)
    pub fn with_capacity(
        user_id: impl Into<String>,
        window: usize,
        intent_capacity: usize,
    ) -> Self {
        let window = window.max(1);
        let intent_capacity = intent_capacity.max(1);
        Self {
            user_id: user_id.into(),
            window,
            valence_hist: VecDeque::with_capacity(window),
            arousal_hist: VecDeque::with_capacity(window),
            intensity_hist: VecDeque::with_capacity(window),
            aus_hist: VecDeque::with_capacity(window),
            intent_capacity,
            cycle_index: 0,
            cooldown: 0,
            intent_history: VecDeque::with_capacity(intent_capacity),
            last_params: None,
        }
    }

    /// Append a sample, advance the cycle, tick down cooldown
    pub fn push(&mut self, sample: &EmotionSample) {
        push_bounded(&mut self.valence_hist, sample.valence, self.window);
        push_bounded(&mut self.arousal_hist, sample.arousal, self.window);
        push_bounded(&mut self.intensity_hist, sample.intensity, self.window);
        push_bounded(&mut self.aus_hist, sample.aus.clone(), self.window);

        self.cycle_index += 1;
        if self.cooldown > 0 {
            self.cooldown -= 1;
        }
    }

    /// Arithmetic means over the window (empty → 0.0)
    pub fn smoothed(&self) -> SmoothedSignal {
        let keys: BTreeSet<&String> = self.aus_hist.iter().flat_map(|m| m.keys()).collect();
        let aus = keys
            .into_iter()
            .map(|key| {
                let total: f64 = self
                    .aus_hist
                    .iter()
                    .map(|m| m.get(key).copied().unwrap_or(0.0))
                    .sum();
                (key.clone(), total / self.aus_hist.len() as f64)
            })
            .collect();

        SmoothedSignal {
            valence: mean(&self.valence_hist),
            arousal: mean(&self.arousal_hist),
            intensity: mean(&self.intensity_hist),
            aus,
        }
    }

    /// Raw valence/arousal of the sample before the latest one
    pub fn previous_raw(&self) -> Option<(f64, f64)> {
        let n = self.valence_hist.len();
        if n < 2 {
            return None;
        }
        Some((self.valence_hist[n - 2], self.arousal_hist[n - 2]))
    }

    /// Record an intent on the bounded recent-intent buffer
    pub(crate) fn record_intent(&mut self, intent: Intent) {
        push_bounded(&mut self.intent_history, intent, self.intent_capacity);
    }

    /// How often `intent` appears in the recent-intent buffer
    pub fn intent_count(&self, intent: Intent) -> usize {
        self.intent_history.iter().filter(|i| **i == intent).count()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Samples currently held
    pub fn len(&self) -> usize {
        self.valence_hist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valence_hist.is_empty()
    }

    pub fn cycle_index(&self) -> u64 {
        self.cycle_index
    }

    /// Cycles remaining before another FULL decision is allowed
    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    pub fn intent_history(&self) -> impl Iterator<Item = &Intent> {
        self.intent_history.iter()
    }

    pub fn last_params(&self) -> Option<&ParameterSet> {
        self.last_params.as_ref()
    }

    /// Forget everything but the user id and capacities
    pub fn reset(&mut self) {
        *self = Self::with_capacity(self.user_id.clone(), self.window, self.intent_capacity);
    }
}

fn push_bounded<T>(buf: &mut VecDeque<T>, value: T, capacity: usize) {
    while buf.len() >= capacity {
        buf.pop_front();
    }
    buf.push_back(value);
}

fn mean(values: &VecDeque<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

// =============================================================================
// TESTS
// =============================================================================
