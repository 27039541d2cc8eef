use serde::{Deserialize, Serialize};

use crate::catalog::GoalSpec;

/// A goal as pursued by one conversation.
///
/// Built from a catalog entry but owned by the conversation: promotions only
/// ever touch this copy, never the shared catalog.
///
/// Mandatory slots MUST be filled for the goal to be met. Optional slots may
/// be promoted to mandatory; mandatory slots are never demoted, and slots
/// outside the declared sets never join the goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub name: String,
    pub triggering_intent: String,
    mandatory_slots: Vec<String>,
    optional_slots: Vec<String>,
    pub actions: Vec<String>,
}

impl Goal {
    pub fn from_spec(spec: &GoalSpec) -> Self {
        Self {
            name: spec.name.clone(),
            triggering_intent: spec.triggering_intent.clone(),
            mandatory_slots: spec.slots_to_fill.mandatory.clone(),
            optional_slots: spec.slots_to_fill.optional.clone(),
            actions: spec.actions.clone(),
        }
    }

    pub fn mandatory_slots(&self) -> &[String] {
        &self.mandatory_slots
    }

    pub fn optional_slots(&self) -> &[String] {
        &self.optional_slots
    }

    pub fn is_mandatory(&self, slot_name: &str) -> bool {
        self.mandatory_slots.iter().any(|s| s == slot_name)
    }

    pub fn is_optional(&self, slot_name: &str) -> bool {
        self.optional_slots.iter().any(|s| s == slot_name)
    }

    /// Optional -> mandatory. Returns `false` (and changes nothing) when the
    /// slot isn't optional in this goal.
    pub fn make_mandatory(&mut self, slot_name: &str) -> bool {
        match self.optional_slots.iter().position(|s| s == slot_name) {
            Some(index) => {
                let slot = self.optional_slots.remove(index);
                self.mandatory_slots.push(slot);
                true
            }
            None => false,
        }
    }
}
