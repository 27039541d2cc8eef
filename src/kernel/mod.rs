pub mod action;
pub mod context;
pub mod goal;
pub mod manager;
pub mod slot;
pub mod telemetry;

pub use action::{Action, ActionFactory, ActionKind, GoalAction, PassiveAction};
pub use context::{Context, ConversationId, Counters, DialogPhase, ExpectedReply, PendingConfirmation};
pub use goal::Goal;
pub use manager::DialogManager;
pub use slot::{Slot, SlotValue};
