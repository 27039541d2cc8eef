use serde::{Deserialize, Serialize};

use crate::error::{DialogError, Result};

/// Tunable constants of the entity corrector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CorrectionConfig {
    /// Two strings are "the same" (typos) when their edit distance is
    /// at most `max_edit_distance_factor * max(len)`.
    pub max_edit_distance_factor: f32,
    /// Confidence lost per edit.
    pub edit_penalty: f32,
    /// Upper bound of the penalty for a substring match.
    pub substring_penalty_cap: f32,
    /// Flat penalty when a number had to be extracted from the raw value.
    pub numeric_extraction_penalty: f32,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            max_edit_distance_factor: 0.1,
            edit_penalty: 0.02,
            substring_penalty_cap: 0.1,
            numeric_extraction_penalty: 0.08,
        }
    }
}

/// Hard/soft confidence pair.
/// Below `hard`: not understood. Between `hard` and `soft`: needs a confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub hard: f32,
    pub soft: f32,
}

/// Policy knobs of the dialog manager. Every field has a default, so a
/// partial `policy.yml` is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PolicyConfig {
    /// Raw utterance text that resets the conversation (case-sensitive).
    pub reset_sentinel: String,
    /// Thresholds used when the message was expected.
    pub expected: Thresholds,
    /// Thresholds used when the message was not expected.
    pub unexpected: Thresholds,

    pub max_confirmation_requests: u32,
    pub max_rephrase_requests: u32,
    pub max_misunderstandings: u32,

    /// Weight of the classifier confidence in the blend.
    pub classifier_weight: f32,
    /// Weight of the entity evidence in the blend.
    pub entity_weight: f32,

    pub correction: CorrectionConfig,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            reset_sentinel: "restart".to_string(),
            expected: Thresholds { hard: 0.4, soft: 0.7 },
            unexpected: Thresholds { hard: 0.5, soft: 0.8 },
            max_confirmation_requests: 1,
            max_rephrase_requests: 2,
            max_misunderstandings: 3,
            classifier_weight: 4.0,
            entity_weight: 3.0,
            correction: CorrectionConfig::default(),
        }
    }
}

impl Thresholds {
    fn check(&self, name: &str) -> Result<()> {
        let in_range = |v: f32| (0.0..=1.0).contains(&v);
        if !in_range(self.hard) || !in_range(self.soft) {
            return Err(DialogError::Configuration(format!(
                "{} thresholds must lie in [0, 1] (hard {}, soft {})",
                name, self.hard, self.soft
            )));
        }
        if self.hard > self.soft {
            return Err(DialogError::Configuration(format!(
                "{} hard threshold {} is above the soft one {}",
                name, self.hard, self.soft
            )));
        }
        Ok(())
    }
}

impl PolicyConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the policy can't work with.
    pub fn validate(&self) -> Result<()> {
        self.expected.check("expected")?;
        self.unexpected.check("unexpected")?;

        let weights = [self.classifier_weight, self.entity_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) || self.classifier_weight + self.entity_weight <= 0.0 {
            return Err(DialogError::Configuration(format!(
                "scorer weights must be non-negative with a positive sum (classifier {}, entity {})",
                self.classifier_weight, self.entity_weight
            )));
        }

        let correction = &self.correction;
        let factors = [
            correction.max_edit_distance_factor,
            correction.edit_penalty,
            correction.substring_penalty_cap,
            correction.numeric_extraction_penalty,
        ];
        if factors.iter().any(|f| !f.is_finite() || *f < 0.0) {
            return Err(DialogError::Configuration(
                "correction factors and penalties must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
