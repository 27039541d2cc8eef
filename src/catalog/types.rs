use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Declared type of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotType {
    Categorical,
    Integer,
    Float,
    Percentage,
    Bool,
}

impl SlotType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, SlotType::Integer | SlotType::Float | SlotType::Percentage)
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotType::Categorical => write!(f, "categorical"),
            SlotType::Integer => write!(f, "integer"),
            SlotType::Float => write!(f, "float"),
            SlotType::Percentage => write!(f, "percentage"),
            SlotType::Bool => write!(f, "bool"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SlotSpec {
    #[serde(skip_deserializing)]
    pub name: String,
    #[serde(rename = "type")]
    pub slot_type: SlotType,
    #[serde(default)]
    pub summary: String,
    /// Accepted values (categorical slots).
    #[serde(default)]
    pub values: Vec<String>,
    /// Canonical value -> synonyms.
    #[serde(default)]
    pub synonyms: BTreeMap<String, Vec<String>>,
}

/// Broad family of an intent. Expected-reply filters match on it.
///
/// The set is open: categories other than the three the policy knows about
/// keep their catalog name, so filters on them stay exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IntentCategory {
    /// Starts a goal.
    Triggering,
    /// Gives slot values.
    Informing,
    /// Yes/no answer to a confirmation request.
    ConfirmationAnswer,
    Other(String),
}

const TRIGGERING: &str = "triggering";
const INFORMING: &str = "informing";
const CONFIRMATION_ANSWER: &str = "confirmation-request-answer";

impl IntentCategory {
    pub fn as_str(&self) -> &str {
        match self {
            IntentCategory::Triggering => TRIGGERING,
            IntentCategory::Informing => INFORMING,
            IntentCategory::ConfirmationAnswer => CONFIRMATION_ANSWER,
            IntentCategory::Other(name) => name,
        }
    }
}

impl From<String> for IntentCategory {
    fn from(name: String) -> Self {
        match name.as_str() {
            TRIGGERING => IntentCategory::Triggering,
            INFORMING => IntentCategory::Informing,
            CONFIRMATION_ANSWER => IntentCategory::ConfirmationAnswer,
            _ => IntentCategory::Other(name),
        }
    }
}

impl From<&str> for IntentCategory {
    fn from(name: &str) -> Self {
        IntentCategory::from(name.to_string())
    }
}

impl From<IntentCategory> for String {
    fn from(category: IntentCategory) -> Self {
        match category {
            IntentCategory::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IntentSpec {
    #[serde(skip_deserializing)]
    pub name: String,
    pub category: IntentCategory,
    #[serde(default)]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub expected_entities: Vec<String>,
    #[serde(default)]
    pub allowed_entities: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

impl IntentSpec {
    /// Entity evidence only matters for intents declaring entity sets.
    pub fn declares_entities(&self) -> bool {
        !self.expected_entities.is_empty() || !self.allowed_entities.is_empty()
    }

    /// Only meaningful for confirmation answers (validated at load time).
    pub fn is_affirmative(&self) -> bool {
        self.sub_category.as_deref() == Some(AFFIRM_SUB_CATEGORY)
    }
}

pub const AFFIRM_SUB_CATEGORY: &str = "affirm";
pub const DENY_SUB_CATEGORY: &str = "deny";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotsToFill {
    #[serde(default)]
    pub mandatory: Vec<String>,
    #[serde(default)]
    pub optional: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GoalSpec {
    #[serde(skip_deserializing)]
    pub name: String,
    pub triggering_intent: String,
    #[serde(default)]
    pub slots_to_fill: SlotsToFill,
    #[serde(default)]
    pub actions: Vec<String>,
}
