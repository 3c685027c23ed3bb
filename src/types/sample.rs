//! Raw emotion measurements from the upstream detector

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One emotion measurement, produced once per cycle by the detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSample {
    /// Detector label (e.g. "angry", "happy")
    #[serde(default = "default_label")]
    pub emotion: String,
    /// Negative ↔ positive affect: -1.0..1.0
    #[serde(default)]
    pub valence: f64,
    /// Calm ↔ excited activation: 0.0..1.0
    #[serde(default)]
    pub arousal: f64,
    /// 0.0..1.0
    #[serde(default)]
    pub intensity: f64,
    /// Facial Action Unit activations (AU4 = brow lowerer, ...), 0.0..1.0
    #[serde(default)]
    pub aus: BTreeMap<String, f64>,
    /// Detector confidence: 0.0..1.0
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_label() -> String {
    "neutral".to_string()
}

fn default_confidence() -> f64 {
    1.0
}

impl Default for EmotionSample {
    fn default() -> Self {
        Self {
            emotion: default_label(),
            valence: 0.0,
            arousal: 0.0,
            intensity: 0.0,
            aus: BTreeMap::new(),
            confidence: default_confidence(),
        }
    }
}

impl EmotionSample {
    /// Create a sample with neutral defaults for everything but valence/arousal
    pub fn new(valence: f64, arousal: f64) -> Self {
        Self {
            valence,
            arousal,
            ..Self::default()
        }
    }

    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = emotion.into();
        self
    }

    pub fn with_intensity(mut self, intensity: f64) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_au(mut self, name: impl Into<String>, activation: f64) -> Self {
        self.aus.insert(name.into(), activation);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Copy with every numeric field forced into its documented interval
    pub fn clamped(&self) -> Self {
        Self {
            emotion: self.emotion.clone(),
            valence: clamp(self.valence, -1.0, 1.0),
            arousal: clamp(self.arousal, 0.0, 1.0),
            intensity: clamp(self.intensity, 0.0, 1.0),
            aus: self
                .aus
                .iter()
                .map(|(k, v)| (k.clone(), clamp(*v, 0.0, 1.0)))
                .collect(),
            confidence: clamp(self.confidence, 0.0, 1.0),
        }
    }

    /// Raw AU activation, 0.0 when the detector did not report it
    pub fn au(&self, name: &str) -> f64 {
        self.aus.get(name).copied().unwrap_or(0.0)
    }
}

/// Clamp `x` into `[lo, hi]`; NaN collapses to `lo`
pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    if x.is_nan() {
        return lo;
    }
    x.max(lo).min(hi)
}

// =============================================================================
// TESTS
// =============================================================================
