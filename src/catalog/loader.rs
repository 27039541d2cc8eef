use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use super::types::{GoalSpec, IntentSpec, SlotSpec};
use super::Catalogs;
use crate::error::{DialogError, Result};

pub const GOALS_FILE: &str = "goals.yml";
pub const INTENTS_FILE: &str = "intents.yml";
pub const SLOTS_FILE: &str = "slots.yml";

#[derive(Deserialize)]
struct GoalsFile {
    goals: BTreeMap<String, GoalSpec>,
}

#[derive(Deserialize)]
struct IntentsFile {
    intents: BTreeMap<String, IntentSpec>,
}

#[derive(Deserialize)]
struct SlotsFile {
    slots: BTreeMap<String, SlotSpec>,
}

impl Catalogs {
    /// Parses the three YAML documents and validates them together.
    /// A document that doesn't parse, or lacks a required field, is a
    /// configuration error naming the file.
    pub fn from_yaml_strs(goals: &str, intents: &str, slots: &str) -> Result<Self> {
        let goals: GoalsFile = parse(GOALS_FILE, goals)?;
        let intents: IntentsFile = parse(INTENTS_FILE, intents)?;
        let slots: SlotsFile = parse(SLOTS_FILE, slots)?;
        Catalogs::new(goals.goals, intents.intents, slots.slots)
    }

    /// Loads `goals.yml`, `intents.yml` and `slots.yml` from `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let goals = fs::read_to_string(dir.join(GOALS_FILE))?;
        let intents = fs::read_to_string(dir.join(INTENTS_FILE))?;
        let slots = fs::read_to_string(dir.join(SLOTS_FILE))?;
        let catalogs = Self::from_yaml_strs(&goals, &intents, &slots)?;
        info!(
            "Catalogs loaded from {}: {} goals, {} intents, {} slots",
            dir.display(),
            catalogs.goals().count(),
            catalogs.intents().count(),
            catalogs.slots().count()
        );
        Ok(catalogs)
    }
}

fn parse<T: DeserializeOwned>(file: &str, source: &str) -> Result<T> {
    serde_yaml::from_str(source).map_err(|e| DialogError::Configuration(format!("{}: {}", file, e)))
}
