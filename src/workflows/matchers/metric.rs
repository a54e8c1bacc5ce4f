use crate::domain::models::{AttributeKey, ReleaseAttributes};

/// Weight of each attribute in the similarity score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeWeights {
    pub quality: f64,
    pub codec: f64,
    pub resolution: f64,
    pub encoder: f64,
    pub audio: f64,
}

impl AttributeWeights {
    pub fn get(&self, key: AttributeKey) -> f64 {
        match key {
            AttributeKey::Quality => self.quality,
            AttributeKey::Codec => self.codec,
            AttributeKey::Resolution => self.resolution,
            AttributeKey::Encoder => self.encoder,
            AttributeKey::Audio => self.audio,
        }
    }

    pub fn total(&self) -> f64 {
        AttributeKey::ALL.iter().map(|k| self.get(*k)).sum()
    }
}

impl Default for AttributeWeights {
    fn default() -> Self {
        Self {
            quality: 5.0,
            codec: 1.5,
            resolution: 1.0,
            encoder: 1.0,
            audio: 0.5,
        }
    }
}

/// Pairwise similarity between two sets of release attributes.
///
/// A key present on both sides contributes its full weight when the values
/// are equal and nothing otherwise. A key missing on either side contributes
/// `weight * missing_key_factor`, whether one or both sides lack it.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeMatchMetric {
    weights: AttributeWeights,
    missing_key_factor: f64,
    threshold: f64,
}

impl AttributeMatchMetric {
    pub const DEFAULT_MISSING_KEY_FACTOR: f64 = 0.5;
    pub const DEFAULT_THRESHOLD: f64 = 2.0;

    pub fn new(weights: AttributeWeights, missing_key_factor: f64, threshold: f64) -> Self {
        Self {
            weights,
            missing_key_factor,
            threshold,
        }
    }

    /// Minimum score a best match must reach to be accepted.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn weights(&self) -> &AttributeWeights {
        &self.weights
    }

    pub fn score(&self, a1: &ReleaseAttributes, a2: &ReleaseAttributes) -> f64 {
        AttributeKey::ALL
            .iter()
            .map(|&key| {
                let weight = self.weights.get(key);
                match (a1.get(key), a2.get(key)) {
                    (Some(v1), Some(v2)) if v1 == v2 => weight,
                    (Some(_), Some(_)) => 0.0,
                    _ => weight * self.missing_key_factor,
                }
            })
            .sum()
    }
}

impl Default for AttributeMatchMetric {
    fn default() -> Self {
        Self::new(
            AttributeWeights::default(),
            Self::DEFAULT_MISSING_KEY_FACTOR,
            Self::DEFAULT_THRESHOLD,
        )
    }
}
