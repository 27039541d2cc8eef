use serde::{Deserialize, Serialize};

/// One classified user utterance, as handed over by the NLU module.
/// Immutable snapshot: the dialog manager never edits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnPayload {
    pub intent: IntentGuess,
    #[serde(default)]
    pub intent_ranking: Vec<IntentGuess>,
    #[serde(default)]
    pub entities: Vec<DetectedEntity>,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentGuess {
    pub name: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedEntity {
    /// Slot name.
    pub entity: String,
    pub value: String,
    pub confidence: f32,
}

impl TurnPayload {
    /// Classifier confidence for `intent`: the top guess first, then the ranking.
    pub fn confidence_of(&self, intent: &str) -> Option<f32> {
        if self.intent.name == intent {
            return Some(self.intent.confidence);
        }
        self.ranked_confidence_of(intent)
    }

    /// Confidence of `intent` in the ranked list only.
    pub fn ranked_confidence_of(&self, intent: &str) -> Option<f32> {
        self.intent_ranking
            .iter()
            .find(|guess| guess.name == intent)
            .map(|guess| guess.confidence)
    }
}
