use serde::{Deserialize, Serialize};

use crate::kernel::action::Action;
use crate::kernel::context::ConversationId;

// Allowed: IDs, catalog names, enums, flags
// Forbidden: utterance text, entity values, slot values

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    TurnDecided {
        conversation: ConversationId,
        branch: DecisionBranch,
        outcome: OutcomeKind,
        /// The anti-repetition filter replaced the decided actions.
        rewritten: bool,
    },

    GoalSwitched {
        conversation: ConversationId,
        from: String,
        to: String,
    },

    ConversationReset {
        conversation: ConversationId,
    },

    /// The turn failed (unknown intent/slot...). The context was left untouched.
    TurnAborted {
        conversation: ConversationId,
    },
}

impl TelemetryEvent {
    pub fn conversation(&self) -> ConversationId {
        match self {
            TelemetryEvent::TurnDecided { conversation, .. }
            | TelemetryEvent::GoalSwitched { conversation, .. }
            | TelemetryEvent::ConversationReset { conversation }
            | TelemetryEvent::TurnAborted { conversation } => *conversation,
        }
    }
}

/// Which branch of the decision tree handled the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionBranch {
    Reset,
    ExpectedConfident,
    ExpectedDoubtful,
    ExpectedNotUnderstood,
    UnexpectedConfident,
    UnexpectedNotUnderstood,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeKind {
    ConfirmIntent,
    ConfirmEntity,
    AskRephrase,
    AskStartOver,
    AskSlotValue,
    GoalActions,
}

impl From<&Action> for OutcomeKind {
    fn from(action: &Action) -> Self {
        match action {
            Action::ConfirmIntent { .. } => OutcomeKind::ConfirmIntent, // Content STRIPPED
            Action::ConfirmEntity { .. } => OutcomeKind::ConfirmEntity, // Content STRIPPED
            Action::AskRephrase => OutcomeKind::AskRephrase,
            Action::AskStartOver => OutcomeKind::AskStartOver,
            Action::AskSlotValue { .. } => OutcomeKind::AskSlotValue,
            Action::Utter { .. } | Action::Run { .. } => OutcomeKind::GoalActions,
        }
    }
}
