use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use super::context::Context;
use crate::error::{DialogError, Result};

/// Prefix of goal actions that are plain utterances.
pub const UTTERANCE_PREFIX: &str = "utter-";
pub const ASK_REPHRASE: &str = "ask-rephrase";
pub const ASK_START_OVER: &str = "ask-start-over";

/// What the agent decided to do. Each kind carries only what a renderer or
/// executor needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Action {
    /// Plain utterance (`utter-*`).
    Utter { name: String },
    AskRephrase,
    AskStartOver,
    AskSlotValue { slot: String },
    ConfirmIntent { intent: String },
    ConfirmEntity { slot: String, value: String },
    /// Domain action listed by a goal, executed outside the core.
    Run { name: String },
}

/// Coarse classification used to advance the conversation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    ConfirmationRequest,
    AskRephrase,
    AskSlotValue,
    Other,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::ConfirmIntent { .. } | Action::ConfirmEntity { .. } => ActionKind::ConfirmationRequest,
            Action::AskRephrase => ActionKind::AskRephrase,
            Action::AskSlotValue { .. } => ActionKind::AskSlotValue,
            Action::Utter { .. } | Action::AskStartOver | Action::Run { .. } => ActionKind::Other,
        }
    }

    pub fn is_confirmation_request(&self) -> bool {
        self.kind() == ActionKind::ConfirmationRequest
    }

    /// Name used to look templates up.
    pub fn name(&self) -> &str {
        match self {
            Action::Utter { name } | Action::Run { name } => name,
            Action::AskRephrase => ASK_REPHRASE,
            Action::AskStartOver => ASK_START_OVER,
            Action::AskSlotValue { .. } => "ask-slot-value",
            Action::ConfirmIntent { .. } => "confirm-intent",
            Action::ConfirmEntity { .. } => "confirm-entity",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::AskSlotValue { slot } => write!(f, "ask-slot-value({})", slot),
            Action::ConfirmIntent { intent } => write!(f, "confirm-intent({})", intent),
            Action::ConfirmEntity { slot, value } => write!(f, "confirm-entity({} = '{}')", slot, value),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Hook given to every goal action right before the goal's actions run.
///
/// An action that turns out to need an optional slot promotes it
/// (`Context::promote_slot`) and returns `true`; the manager then asks for
/// that slot instead of running the actions.
pub trait GoalAction: Send + Sync {
    fn promote_needed_optional_slots(&self, _context: &mut Context) -> Result<bool> {
        Ok(false)
    }
}

/// Never needs more information.
pub struct PassiveAction;

impl GoalAction for PassiveAction {}

/// Turns goal action names into `Action`s and holds the domain hooks.
pub struct ActionFactory {
    handlers: HashMap<String, Box<dyn GoalAction>>,
    passive: PassiveAction,
}

impl Default for ActionFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionFactory {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            passive: PassiveAction,
        }
    }

    /// Registers the domain hook of the goal action `name`.
    pub fn register(&mut self, name: impl Into<String>, handler: Box<dyn GoalAction>) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn instantiate(&self, name: &str) -> Result<Action> {
        if name.trim().is_empty() {
            return Err(DialogError::Configuration(
                "tried to instantiate an action with no name".to_string(),
            ));
        }
        if name.starts_with(UTTERANCE_PREFIX) {
            return Ok(Action::Utter { name: name.to_string() });
        }
        Ok(Action::Run { name: name.to_string() })
    }

    /// Hook of `action`. Unregistered actions get the passive one.
    pub fn handler_for(&self, action: &Action) -> &dyn GoalAction {
        match self.handlers.get(action.name()) {
            Some(handler) => handler.as_ref(),
            None => {
                debug!("No hook registered for action '{}', using the passive one", action.name());
                &self.passive
            }
        }
    }
}
