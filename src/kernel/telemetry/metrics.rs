use std::collections::VecDeque;
use super::event::{TelemetryEvent, OutcomeKind};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub turn_stats: TurnStats,
    pub dialogue_stats: DialogueStats,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnStats {
    pub decided: u64,
    pub aborted: u64,
    /// Turns whose actions were replaced by the anti-repetition filter.
    pub rewritten: u64,
    pub rewrite_ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialogueStats {
    pub intent_confirmations: u64,
    pub entity_confirmations: u64,
    pub rephrases: u64,
    pub start_overs: u64,
    pub slot_requests: u64,
    pub goals_completed: u64,
    pub goal_switches: u64,
    pub resets: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::TurnDecided { outcome, rewritten, .. } => {
                snap.turn_stats.decided += 1;
                if *rewritten {
                    snap.turn_stats.rewritten += 1;
                }
                match outcome {
                    OutcomeKind::ConfirmIntent => snap.dialogue_stats.intent_confirmations += 1,
                    OutcomeKind::ConfirmEntity => snap.dialogue_stats.entity_confirmations += 1,
                    OutcomeKind::AskRephrase => snap.dialogue_stats.rephrases += 1,
                    OutcomeKind::AskStartOver => snap.dialogue_stats.start_overs += 1,
                    OutcomeKind::AskSlotValue => snap.dialogue_stats.slot_requests += 1,
                    OutcomeKind::GoalActions => snap.dialogue_stats.goals_completed += 1,
                }
            }
            TelemetryEvent::GoalSwitched { .. } => snap.dialogue_stats.goal_switches += 1,
            TelemetryEvent::ConversationReset { .. } => snap.dialogue_stats.resets += 1,
            TelemetryEvent::TurnAborted { .. } => snap.turn_stats.aborted += 1,
        }
    }

    if snap.turn_stats.decided > 0 {
        snap.turn_stats.rewrite_ratio = snap.turn_stats.rewritten as f64 / snap.turn_stats.decided as f64;
    }

    snap
}
