use std::collections::VecDeque;

use super::event::TelemetryEvent;
use super::metrics::{compute_snapshot, TelemetrySnapshot};
use crate::kernel::context::ConversationId;

pub const DEFAULT_MAX_EVENTS: usize = 10_000;

/// Bounded event log. When full, the oldest events go first.
#[derive(Debug)]
pub struct TelemetryRecorder {
    buffer: VecDeque<TelemetryEvent>,
    max_events: usize,
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self::with_max_events(DEFAULT_MAX_EVENTS)
    }

    pub fn with_max_events(max_events: usize) -> Self {
        let max_events = max_events.max(1);
        Self {
            buffer: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    pub fn record(&mut self, event: TelemetryEvent) {
        while self.buffer.len() >= self.max_events {
            self.buffer.pop_front();
        }
        self.buffer.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn events(&self) -> impl Iterator<Item = &TelemetryEvent> {
        self.buffer.iter()
    }

    /// Events of one conversation, oldest first.
    pub fn events_for(&self, conversation: ConversationId) -> impl Iterator<Item = &TelemetryEvent> {
        self.buffer.iter().filter(move |event| event.conversation() == conversation)
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        compute_snapshot(&self.buffer)
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
