//! Static goal / intent / slot catalogs.
//!
//! Built once at startup, validated, then shared read-only (`Arc<Catalogs>`)
//! by every conversation. Nothing mutates a catalog after `Catalogs::new`.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{DialogError, Result};

/// Reserved trigger of the goal a conversation starts (and resets) to.
pub const INITIAL_GOAL_TRIGGER: &str = "_init";

#[derive(Debug, Clone)]
pub struct Catalogs {
    goals: BTreeMap<String, GoalSpec>,
    intents: BTreeMap<String, IntentSpec>,
    slots: BTreeMap<String, SlotSpec>,
    goals_by_trigger: HashMap<String, String>,
    initial_goal: String,
}

impl Catalogs {
    /// Validates and bundles the three catalogs. Map keys win over any `name`
    /// field already set on the specs.
    pub fn new(
        goals: BTreeMap<String, GoalSpec>,
        intents: BTreeMap<String, IntentSpec>,
        slots: BTreeMap<String, SlotSpec>,
    ) -> Result<Self> {
        let goals: BTreeMap<String, GoalSpec> = goals
            .into_iter()
            .map(|(name, mut spec)| {
                spec.name = name.clone();
                (name, spec)
            })
            .collect();
        let intents: BTreeMap<String, IntentSpec> = intents
            .into_iter()
            .map(|(name, mut spec)| {
                spec.name = name.clone();
                (name, spec)
            })
            .collect();
        let slots: BTreeMap<String, SlotSpec> = slots
            .into_iter()
            .map(|(name, mut spec)| {
                spec.name = name.clone();
                (name, spec)
            })
            .collect();

        validate_slots(&slots)?;
        validate_intents(&intents, &slots)?;
        let goals_by_trigger = validate_goals(&goals, &intents, &slots)?;

        let initial_goal = goals_by_trigger
            .get(INITIAL_GOAL_TRIGGER)
            .cloned()
            .ok_or_else(|| {
                DialogError::Configuration(format!(
                    "no goal is triggered by '{}' (the initial goal)",
                    INITIAL_GOAL_TRIGGER
                ))
            })?;

        Ok(Self {
            goals,
            intents,
            slots,
            goals_by_trigger,
            initial_goal,
        })
    }

    pub fn goal(&self, name: &str) -> Result<&GoalSpec> {
        self.goals
            .get(name)
            .ok_or_else(|| DialogError::UnknownGoal(name.to_string()))
    }

    pub fn intent(&self, name: &str) -> Result<&IntentSpec> {
        self.intents
            .get(name)
            .ok_or_else(|| DialogError::UnknownIntent(name.to_string()))
    }

    pub fn slot(&self, name: &str) -> Result<&SlotSpec> {
        self.slots
            .get(name)
            .ok_or_else(|| DialogError::UnknownSlot(name.to_string()))
    }

    /// The goal `intent` triggers, if any.
    pub fn goal_triggered_by(&self, intent: &str) -> Option<&GoalSpec> {
        self.goals_by_trigger
            .get(intent)
            .and_then(|name| self.goals.get(name))
    }

    pub fn initial_goal(&self) -> &GoalSpec {
        // Presence checked in `new`.
        &self.goals[&self.initial_goal]
    }

    pub fn goals(&self) -> impl Iterator<Item = &GoalSpec> {
        self.goals.values()
    }

    pub fn intents(&self) -> impl Iterator<Item = &IntentSpec> {
        self.intents.values()
    }

    pub fn slots(&self) -> impl Iterator<Item = &SlotSpec> {
        self.slots.values()
    }
}

fn config_error(msg: String) -> DialogError {
    DialogError::Configuration(msg)
}

fn validate_slots(slots: &BTreeMap<String, SlotSpec>) -> Result<()> {
    for slot in slots.values() {
        if slot.slot_type == SlotType::Categorical && slot.values.is_empty() {
            return Err(config_error(format!(
                "categorical slot '{}' declares no values",
                slot.name
            )));
        }
        for canonical in slot.synonyms.keys() {
            if !slot.values.contains(canonical) {
                return Err(config_error(format!(
                    "slot '{}' declares synonyms for '{}', which is not one of its values",
                    slot.name, canonical
                )));
            }
        }
    }
    Ok(())
}

fn validate_intents(
    intents: &BTreeMap<String, IntentSpec>,
    slots: &BTreeMap<String, SlotSpec>,
) -> Result<()> {
    for intent in intents.values() {
        match intent.category {
            IntentCategory::Triggering => {
                if intent.sub_category.is_none() {
                    return Err(config_error(format!(
                        "triggering intent '{}' has no sub-category",
                        intent.name
                    )));
                }
            }
            IntentCategory::ConfirmationAnswer => match intent.sub_category.as_deref() {
                Some(AFFIRM_SUB_CATEGORY) | Some(DENY_SUB_CATEGORY) => {}
                Some(other) => {
                    return Err(config_error(format!(
                        "confirmation answer '{}' has sub-category '{}' (expected '{}' or '{}')",
                        intent.name, other, AFFIRM_SUB_CATEGORY, DENY_SUB_CATEGORY
                    )))
                }
                None => {
                    return Err(config_error(format!(
                        "confirmation answer '{}' has no sub-category",
                        intent.name
                    )))
                }
            },
            IntentCategory::Informing | IntentCategory::Other(_) => {}
        }

        for entity in intent.expected_entities.iter().chain(&intent.allowed_entities) {
            if !slots.contains_key(entity) {
                return Err(config_error(format!(
                    "intent '{}' references unknown slot '{}'",
                    intent.name, entity
                )));
            }
        }
    }
    Ok(())
}

fn validate_goals(
    goals: &BTreeMap<String, GoalSpec>,
    intents: &BTreeMap<String, IntentSpec>,
    slots: &BTreeMap<String, SlotSpec>,
) -> Result<HashMap<String, String>> {
    let mut by_trigger = HashMap::new();

    for goal in goals.values() {
        let trigger = &goal.triggering_intent;
        if trigger.is_empty() {
            return Err(config_error(format!("goal '{}' has no triggering intent", goal.name)));
        }
        if let Some(previous) = by_trigger.insert(trigger.clone(), goal.name.clone()) {
            return Err(config_error(format!(
                "goals '{}' and '{}' share the triggering intent '{}' (an intent may trigger only one goal)",
                previous, goal.name, trigger
            )));
        }

        if trigger != INITIAL_GOAL_TRIGGER {
            match intents.get(trigger) {
                Some(intent) if intent.category == IntentCategory::Triggering => {}
                Some(_) => {
                    return Err(config_error(format!(
                        "goal '{}' is triggered by '{}', which is not a triggering intent",
                        goal.name, trigger
                    )))
                }
                None => {
                    return Err(config_error(format!(
                        "goal '{}' is triggered by unknown intent '{}'",
                        goal.name, trigger
                    )))
                }
            }
        }

        let mandatory: HashSet<&String> = goal.slots_to_fill.mandatory.iter().collect();
        for slot_name in goal.slots_to_fill.mandatory.iter().chain(&goal.slots_to_fill.optional) {
            if !slots.contains_key(slot_name) {
                return Err(config_error(format!(
                    "goal '{}' references unknown slot '{}'",
                    goal.name, slot_name
                )));
            }
        }
        if let Some(both) = goal.slots_to_fill.optional.iter().find(|s| mandatory.contains(s)) {
            return Err(config_error(format!(
                "slot '{}' is both mandatory and optional in goal '{}'",
                both, goal.name
            )));
        }

        if goal.actions.is_empty() {
            return Err(config_error(format!("goal '{}' has no actions", goal.name)));
        }
        if goal.actions.iter().any(|a| a.trim().is_empty()) {
            return Err(config_error(format!("goal '{}' has an action without a name", goal.name)));
        }
    }

    for intent in intents.values() {
        if intent.category == IntentCategory::Triggering && !by_trigger.contains_key(&intent.name) {
            return Err(config_error(format!(
                "triggering intent '{}' doesn't trigger any goal",
                intent.name
            )));
        }
    }

    Ok(by_trigger)
}
