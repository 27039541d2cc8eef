use std::sync::Arc;
use tracing::debug;

use super::payload::{DetectedEntity, TurnPayload};
use crate::catalog::Catalogs;
use crate::error::{DialogError, Result};

/// Blends the classifier confidence of an intent with the evidence brought by
/// the (corrected) entities found in the same message.
///
/// With M, P and U the mean confidences of expected, allowed-only and
/// unexpected entities (0 when there are none):
///
/// ```text
/// C = log2(M+1) / (log2(0.8*P+1) + 1) + (P > 0 ? 1/(2 - log2(P)) : 0)
/// F = C / (log2(U+1) + 1)
/// ```
///
/// and the result is the weighted mean of the classifier confidence and F,
/// clamped to [0, 1].
pub struct ConfidenceScorer {
    catalogs: Arc<Catalogs>,
    classifier_weight: f32,
    entity_weight: f32,
}

#[derive(Default)]
struct MeanAccumulator {
    sum: f32,
    count: u32,
}

impl MeanAccumulator {
    fn push(&mut self, confidence: f32) {
        self.sum += confidence;
        self.count += 1;
    }

    fn mean(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f32
        }
    }
}

impl ConfidenceScorer {
    pub fn new(catalogs: Arc<Catalogs>, classifier_weight: f32, entity_weight: f32) -> Self {
        Self {
            catalogs,
            classifier_weight,
            entity_weight,
        }
    }

    pub fn score(&self, intent_name: &str, payload: &TurnPayload, entities: &[DetectedEntity]) -> Result<f32> {
        let intent = self.catalogs.intent(intent_name)?;

        if !intent.declares_entities() {
            return payload
                .confidence_of(intent_name)
                .map(|c| c.clamp(0.0, 1.0))
                .ok_or_else(|| DialogError::IntentNotRanked(intent_name.to_string()));
        }

        let mut expected = MeanAccumulator::default();
        let mut allowed = MeanAccumulator::default();
        let mut unexpected = MeanAccumulator::default();
        for entity in entities {
            if intent.expected_entities.contains(&entity.entity) {
                expected.push(entity.confidence);
            } else if intent.allowed_entities.contains(&entity.entity) {
                allowed.push(entity.confidence);
            } else {
                unexpected.push(entity.confidence);
            }
        }
        let entity_confidence = entity_evidence(expected.mean(), allowed.mean(), unexpected.mean());

        let classifier_confidence = payload
            .ranked_confidence_of(intent_name)
            .ok_or_else(|| DialogError::IntentNotRanked(intent_name.to_string()))?;

        let total_weight = self.classifier_weight + self.entity_weight;
        if !(total_weight > 0.0) {
            return Err(DialogError::Configuration(format!(
                "scorer weights sum to {}, nothing to blend",
                total_weight
            )));
        }
        let blended = (self.classifier_weight * classifier_confidence + self.entity_weight * entity_confidence)
            / total_weight;

        debug!(
            "Confidence for '{}': {} -> {} (F = {})",
            intent_name, classifier_confidence, blended, entity_confidence
        );
        Ok(blended.clamp(0.0, 1.0))
    }
}

/// F, from the mean confidences of expected (m), allowed (p) and unexpected (u) entities.
pub fn entity_evidence(m: f32, p: f32, u: f32) -> f32 {
    let mut c = (m + 1.0).log2() / ((0.8 * p + 1.0).log2() + 1.0);
    if p > 0.0 {
        c += 1.0 / (2.0 - p.log2());
    }
    c / ((u + 1.0).log2() + 1.0)
}
