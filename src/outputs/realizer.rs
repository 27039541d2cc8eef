use serde::Deserialize;
use std::collections::HashMap;

use crate::catalog::Catalogs;
use crate::error::{DialogError, Result};
use crate::kernel::{Action, Context};

pub const TEMPLATES_FILE: &str = "templates.yml";

#[derive(Deserialize)]
struct TemplatesFile {
    templates: HashMap<String, Vec<String>>,
}

/// Template-based realization of utterance actions.
///
/// A template is plain text where `$name$` is replaced by the value of the
/// slot `name`, plus a few keys bound by the action itself:
/// `$slot-name$` (ask-slot-value), `$intent-summary$` (confirm-intent),
/// `$slot-summary$` / `$slot-value$` (confirm-entity).
#[derive(Debug, Clone, Default)]
pub struct TemplateRealizer {
    templates: HashMap<String, Vec<String>>,
}

impl TemplateRealizer {
    pub fn new(templates: HashMap<String, Vec<String>>) -> Self {
        Self { templates }
    }

    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let file: TemplatesFile = serde_yaml::from_str(source)?;
        Ok(Self::new(file.templates))
    }

    /// PURE FUNCTION: first template of the action's utterance, filled in.
    pub fn realize(&self, action: &Action, context: &Context, catalogs: &Catalogs) -> Result<String> {
        let template = self
            .templates
            .get(action.name())
            .and_then(|list| list.first())
            .ok_or_else(|| DialogError::MissingTemplate(action.name().to_string()))?;

        let mut bindings: Vec<(String, String)> = Vec::new();
        match action {
            Action::AskSlotValue { slot } => {
                bindings.push(("slot-name".to_string(), summary_or_name(&catalogs.slot(slot)?.summary, slot)));
            }
            Action::ConfirmIntent { intent } => {
                bindings.push((
                    "intent-summary".to_string(),
                    summary_or_name(&catalogs.intent(intent)?.summary, intent),
                ));
            }
            Action::ConfirmEntity { slot, value } => {
                bindings.push(("slot-summary".to_string(), summary_or_name(&catalogs.slot(slot)?.summary, slot)));
                bindings.push(("slot-value".to_string(), value.clone()));
            }
            Action::Utter { .. } | Action::AskRephrase | Action::AskStartOver | Action::Run { .. } => {}
        }
        for slot in context.slots() {
            if let Some(value) = slot.value() {
                bindings.push((slot.name().to_string(), value.to_string()));
            }
        }

        let mut msg = template.clone();
        for (key, value) in bindings {
            msg = msg.replace(&format!("${}$", key), &value);
        }
        Ok(msg)
    }
}

fn summary_or_name(summary: &str, name: &str) -> String {
    if summary.is_empty() {
        name.to_string()
    } else {
        summary.to_string()
    }
}
