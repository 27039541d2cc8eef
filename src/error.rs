use thiserror::Error;

/// Failures that abort a turn or refuse a boot.
///
/// Misunderstandings are NOT errors: low confidence is handled in normal
/// control flow (rephrase / confirmation requests). Unmatched entities are
/// dropped silently by the corrector.
#[derive(Debug, Error)]
pub enum DialogError {
    /// Malformed catalogs. Boot-fatal.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The classifier returned an intent the intents catalog doesn't know.
    #[error("Unknown intent: '{0}'")]
    UnknownIntent(String),

    /// Code or data referenced a slot absent from the slot catalog.
    #[error("Unknown slot: '{0}'")]
    UnknownSlot(String),

    #[error("Unknown goal: '{0}'")]
    UnknownGoal(String),

    /// The candidate intent is missing from the payload's ranked list.
    #[error("Intent '{0}' is absent from the intent ranking")]
    IntentNotRanked(String),

    #[error("No template for utterance '{0}'")]
    MissingTemplate(String),

    #[error("Catalog file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, DialogError>;
