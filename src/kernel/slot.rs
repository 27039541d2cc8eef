use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::{SlotSpec, SlotType};

/// Typed view of a stored slot value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SlotValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

/// A slot of one conversation: its declared type and, maybe, a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    name: String,
    slot_type: SlotType,
    accepted: Vec<String>,
    value: Option<String>,
}

impl Slot {
    pub fn from_spec(spec: &SlotSpec) -> Self {
        Self {
            name: spec.name.clone(),
            slot_type: spec.slot_type,
            accepted: spec.values.clone(),
            value: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot_type(&self) -> SlotType {
        self.slot_type
    }

    /// Stores `value`. A value that doesn't fit the declared type is kept
    /// anyway; the mismatch is only reported.
    pub fn set(&mut self, value: impl Into<String>) {
        let value = value.into();
        if Self::coerce(self.slot_type, &value).is_none() {
            warn!(
                "Slot '{}' of type {} was set with a value of another type ('{}')",
                self.name, self.slot_type, value
            );
        } else if self.slot_type == SlotType::Categorical
            && !self.accepted.is_empty()
            && !self.accepted.contains(&value)
        {
            warn!("Slot '{}' was set with a value outside its accepted values ('{}')", self.name, value);
        }
        self.value = Some(value);
    }

    pub fn unset(&mut self) {
        self.value = None;
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Best-effort typed value; `None` when unset or not coercible.
    pub fn typed_value(&self) -> Option<SlotValue> {
        self.value.as_deref().and_then(|v| Self::coerce(self.slot_type, v))
    }

    fn coerce(slot_type: SlotType, raw: &str) -> Option<SlotValue> {
        let raw = raw.trim();
        match slot_type {
            SlotType::Categorical => Some(SlotValue::Text(raw.to_string())),
            SlotType::Integer => raw.parse().ok().map(SlotValue::Integer),
            SlotType::Float | SlotType::Percentage => raw.parse().ok().map(SlotValue::Float),
            SlotType::Bool => match raw.to_lowercase().as_str() {
                "true" | "yes" => Some(SlotValue::Bool(true)),
                "false" | "no" => Some(SlotValue::Bool(false)),
                _ => None,
            },
        }
    }
}
