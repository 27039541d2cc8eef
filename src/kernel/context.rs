use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::action::{Action, ActionKind};
use super::goal::Goal;
use super::slot::Slot;
use crate::catalog::{Catalogs, IntentCategory};
use crate::config::PolicyConfig;
use crate::error::{DialogError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub Uuid);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Describes which next user messages count as an answer to the agent's
/// last utterance. From the most precise to the broadest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpectedReply {
    Intent(String),
    SubCategory {
        category: IntentCategory,
        sub_category: String,
    },
    Category(IntentCategory),
}

/// The one thing (if any) waiting for a yes/no from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingConfirmation {
    NewGoal(Goal),
    Entity { slot: String, value: String },
}

/// Explicit view of where the conversation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogPhase {
    Initial,
    PursuingGoal,
    AwaitingSlotConfirmation,
    AwaitingGoalConfirmation,
    AwaitingRephrase,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub confirmation_requests: u32,
    pub rephrases: u32,
    pub misunderstandings: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Caps {
    confirmation_requests: u32,
    rephrases: u32,
    misunderstandings: u32,
}

/// State of one conversation: current goal, slot values, what kind of reply
/// is expected next and what awaits confirmation.
///
/// Owned by exactly one conversation. Never share a Context between
/// concurrent turns.
#[derive(Debug, Clone)]
pub struct Context {
    id: ConversationId,
    catalogs: Arc<Catalogs>,
    caps: Caps,
    current_goal: Goal,
    slots: BTreeMap<String, Slot>,
    expected_replies: Vec<ExpectedReply>,
    pending: Option<PendingConfirmation>,
    counters: Counters,
    goal_switches: u64,
}

impl Context {
    pub fn new(catalogs: Arc<Catalogs>, config: &PolicyConfig) -> Self {
        let slots = catalogs
            .slots()
            .map(|spec| (spec.name.clone(), Slot::from_spec(spec)))
            .collect();
        let current_goal = Goal::from_spec(catalogs.initial_goal());
        Self {
            id: ConversationId::new(),
            caps: Caps {
                confirmation_requests: config.max_confirmation_requests,
                rephrases: config.max_rephrase_requests,
                misunderstandings: config.max_misunderstandings,
            },
            catalogs,
            current_goal,
            slots,
            expected_replies: initial_expectations(),
            pending: None,
            counters: Counters::default(),
            goal_switches: 0,
        }
    }

    pub fn id(&self) -> ConversationId {
        self.id
    }

    /// Back to the initial goal, nothing filled, nothing pending.
    pub fn reset(&mut self) {
        info!(conversation = ?self.id, "Conversation reset");
        self.current_goal = Goal::from_spec(self.catalogs.initial_goal());
        self.clear_slots();
        self.pending = None;
        self.counters = Counters::default();
        self.expected_replies = initial_expectations();
    }

    pub fn phase(&self) -> DialogPhase {
        match &self.pending {
            Some(PendingConfirmation::NewGoal(_)) => DialogPhase::AwaitingGoalConfirmation,
            Some(PendingConfirmation::Entity { .. }) => DialogPhase::AwaitingSlotConfirmation,
            None if self.counters.rephrases > 0 => DialogPhase::AwaitingRephrase,
            None if self.is_initial() => DialogPhase::Initial,
            None => DialogPhase::PursuingGoal,
        }
    }

    fn is_initial(&self) -> bool {
        self.current_goal.name == self.catalogs.initial_goal().name && self.slots.values().all(|s| !s.is_set())
    }

    // ---- Goal ----

    pub fn current_goal(&self) -> &Goal {
        &self.current_goal
    }

    /// Switches to `goal` right away. Slots aren't carried over.
    pub fn set_goal(&mut self, goal: Goal) {
        info!(conversation = ?self.id, "Goal switched: '{}' -> '{}'", self.current_goal.name, goal.name);
        self.current_goal = goal;
        self.clear_slots();
        self.pending = None;
        self.goal_switches += 1;
    }

    /// How many times `set_goal` ran on this conversation, re-triggers of the
    /// current goal included. Resets don't count.
    pub fn goal_switches(&self) -> u64 {
        self.goal_switches
    }

    pub fn goal_is_met(&self) -> Result<bool> {
        Ok(self.lacking_slot()?.is_none())
    }

    /// First unfilled mandatory slot of the current goal, in declared order.
    pub fn lacking_slot(&self) -> Result<Option<String>> {
        for slot_name in self.current_goal.mandatory_slots() {
            if !self.is_set(slot_name)? {
                return Ok(Some(slot_name.clone()));
            }
        }
        Ok(None)
    }

    /// Optional -> mandatory on this conversation's goal.
    /// `Ok(false)` when the slot isn't optional.
    pub fn promote_slot(&mut self, slot_name: &str) -> Result<bool> {
        self.slot(slot_name)?;
        let promoted = self.current_goal.make_mandatory(slot_name);
        if promoted {
            debug!(conversation = ?self.id, "Slot '{}' promoted to mandatory", slot_name);
        }
        Ok(promoted)
    }

    // ---- Slots ----

    fn slot(&self, slot_name: &str) -> Result<&Slot> {
        self.slots
            .get(slot_name)
            .ok_or_else(|| DialogError::UnknownSlot(slot_name.to_string()))
    }

    pub fn set_slot(&mut self, slot_name: &str, value: impl Into<String>) -> Result<()> {
        let slot = self
            .slots
            .get_mut(slot_name)
            .ok_or_else(|| DialogError::UnknownSlot(slot_name.to_string()))?;
        slot.set(value);
        Ok(())
    }

    pub fn is_set(&self, slot_name: &str) -> Result<bool> {
        Ok(self.slot(slot_name)?.is_set())
    }

    pub fn get_slot_value(&self, slot_name: &str) -> Result<Option<&str>> {
        Ok(self.slot(slot_name)?.value())
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.values()
    }

    fn clear_slots(&mut self) {
        for slot in self.slots.values_mut() {
            slot.unset();
        }
    }

    // ---- Pending confirmations ----

    pub fn pending(&self) -> Option<&PendingConfirmation> {
        self.pending.as_ref()
    }

    pub fn pending_goal(&self) -> Option<&Goal> {
        match &self.pending {
            Some(PendingConfirmation::NewGoal(goal)) => Some(goal),
            _ => None,
        }
    }

    /// Stores a goal awaiting a yes/no. Pre-empts any entity confirmation.
    pub fn set_potential_new_goal(&mut self, goal: Goal) {
        self.pending = Some(PendingConfirmation::NewGoal(goal));
    }

    /// Switches to the pending goal. Returns `false` if no goal was pending.
    pub fn confirm_new_goal(&mut self) -> bool {
        match self.pending.take() {
            Some(PendingConfirmation::NewGoal(goal)) => {
                self.set_goal(goal);
                self.counters = Counters::default();
                true
            }
            other => {
                self.pending = other;
                false
            }
        }
    }

    pub fn discard_potential_new_goal(&mut self) {
        if matches!(self.pending, Some(PendingConfirmation::NewGoal(_))) {
            self.pending = None;
        }
    }

    /// Stores a slot value awaiting a yes/no. Refused (`Ok(false)`) while a
    /// goal confirmation is pending.
    pub fn set_pending_entity(&mut self, slot_name: &str, value: impl Into<String>) -> Result<bool> {
        self.slot(slot_name)?;
        if self.pending_goal().is_some() {
            return Ok(false);
        }
        self.pending = Some(PendingConfirmation::Entity {
            slot: slot_name.to_string(),
            value: value.into(),
        });
        Ok(true)
    }

    /// Commits the pending slot value. Returns `false` if none was pending.
    pub fn confirm_pending_entity(&mut self) -> Result<bool> {
        match self.pending.take() {
            Some(PendingConfirmation::Entity { slot, value }) => {
                self.set_slot(&slot, value)?;
                Ok(true)
            }
            other => {
                self.pending = other;
                Ok(false)
            }
        }
    }

    pub fn discard_pending_entity(&mut self) {
        if matches!(self.pending, Some(PendingConfirmation::Entity { .. })) {
            self.pending = None;
        }
    }

    // ---- Expected replies ----

    pub fn expected_replies(&self) -> &[ExpectedReply] {
        &self.expected_replies
    }

    pub fn expect(&mut self, expected_replies: Vec<ExpectedReply>) {
        self.expected_replies = expected_replies;
    }

    /// Whether a message with intent `intent_name` answers the last utterance.
    pub fn is_expecting(&self, intent_name: &str) -> Result<bool> {
        let intent = self.catalogs.intent(intent_name)?;
        Ok(self.expected_replies.iter().any(|expected| match expected {
            ExpectedReply::Intent(name) => name == intent_name,
            ExpectedReply::SubCategory { category, sub_category } => {
                category.as_str() == intent.category.as_str()
                    && intent.sub_category.as_deref() == Some(sub_category.as_str())
            }
            ExpectedReply::Category(category) => category.as_str() == intent.category.as_str(),
        }))
    }

    // ---- Counters ----

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn may_ask_confirmation(&self) -> bool {
        self.counters.confirmation_requests < self.caps.confirmation_requests
            && self.counters.misunderstandings < self.caps.misunderstandings
    }

    pub fn may_ask_rephrase(&self) -> bool {
        self.counters.rephrases < self.caps.rephrases && self.counters.misunderstandings < self.caps.misunderstandings
    }

    /// Advances counters and expectations from what the agent is about to
    /// say. Only the last action matters: the agent speaks one message at a
    /// time.
    pub fn update_from(&mut self, next_actions: &[Action]) {
        let Some(last_action) = next_actions.last() else {
            return;
        };
        match last_action.kind() {
            ActionKind::ConfirmationRequest => {
                self.counters.confirmation_requests += 1;
                self.counters.rephrases = 0;
                self.counters.misunderstandings += 1;
                self.expected_replies = vec![
                    ExpectedReply::Category(IntentCategory::ConfirmationAnswer),
                    ExpectedReply::Category(IntentCategory::Informing),
                ];
            }
            ActionKind::AskRephrase => {
                self.counters.rephrases += 1;
                self.counters.confirmation_requests = 0;
                self.counters.misunderstandings += 1;
                self.expected_replies = initial_expectations();
            }
            ActionKind::AskSlotValue => {
                self.counters = Counters::default();
                self.expected_replies = vec![ExpectedReply::Category(IntentCategory::Informing)];
            }
            ActionKind::Other => {
                self.counters = Counters::default();
                self.expected_replies = initial_expectations();
            }
        }
    }
}

fn initial_expectations() -> Vec<ExpectedReply> {
    vec![ExpectedReply::Category(IntentCategory::Triggering)]
}
