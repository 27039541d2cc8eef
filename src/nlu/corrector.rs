use regex::Regex;
use std::sync::Arc;
use tracing::debug;

use super::payload::DetectedEntity;
use crate::catalog::{Catalogs, SlotSpec, SlotType};
use crate::config::CorrectionConfig;
use crate::error::Result;

/// Normalizes raw entity values against the slot catalog.
///
/// Rules are tried in order and the first one that matches wins:
/// exact value, typo/substring match, number extraction (numeric slots),
/// synonyms. Anything else is discarded.
pub struct EntityCorrector {
    catalogs: Arc<Catalogs>,
    config: CorrectionConfig,
    integer_re: Regex,
    float_re: Regex,
}

/// A raw string matched to a canonical value.
struct Match {
    canonical: String,
    penalty: f32,
}

impl EntityCorrector {
    pub fn new(catalogs: Arc<Catalogs>, config: CorrectionConfig) -> Self {
        Self {
            catalogs,
            config,
            integer_re: Regex::new(r"[0-9]+").expect("static regex"),
            // Also catches percentages
            float_re: Regex::new(r"[0-9]+(\.[0-9]+)?").expect("static regex"),
        }
    }

    /// Returns the corrected entities. Unmatchable ones are dropped;
    /// an entity naming an unknown slot aborts with `UnknownSlot`.
    pub fn correct(&self, entities: &[DetectedEntity]) -> Result<Vec<DetectedEntity>> {
        let mut corrected = Vec::with_capacity(entities.len());
        for entity in entities {
            let slot = self.catalogs.slot(&entity.entity)?;
            match self.correct_value(slot, &entity.value) {
                Some(m) => {
                    debug!(
                        "Correcting '{}' -> '{}' for slot '{}' (confidence drop: {})",
                        entity.value, m.canonical, slot.name, m.penalty
                    );
                    corrected.push(DetectedEntity {
                        entity: entity.entity.clone(),
                        value: m.canonical,
                        confidence: (entity.confidence - m.penalty).max(0.0),
                    });
                }
                None => {
                    debug!("Discarding incorrect entity '{}' for slot '{}'", entity.value, slot.name);
                }
            }
        }
        Ok(corrected)
    }

    fn correct_value(&self, slot: &SlotSpec, raw: &str) -> Option<Match> {
        // 1. Exact
        let trimmed = raw.trim();
        if slot.values.iter().any(|v| v == trimmed) {
            return Some(Match {
                canonical: trimmed.to_string(),
                penalty: 0.0,
            });
        }

        // 2. Typos / substring
        let candidates = slot.values.iter().map(|v| (v.as_str(), v.as_str()));
        if let Some(m) = self.fuzzy_match(raw, candidates) {
            return Some(m);
        }

        // 3. Numbers
        if slot.slot_type.is_numeric() {
            if let Some(m) = self.extract_number(slot.slot_type, raw) {
                return Some(m);
            }
        }

        // 4. Synonyms, in declared value order
        let synonyms = slot.values.iter().flat_map(|value| {
            slot.synonyms
                .get(value)
                .into_iter()
                .flatten()
                .map(move |syn| (syn.as_str(), value.as_str()))
        });
        self.fuzzy_match(raw, synonyms)
    }

    /// `candidates` are `(string to compare, canonical value)` pairs.
    fn fuzzy_match<'a, I>(&self, raw: &str, candidates: I) -> Option<Match>
    where
        I: Iterator<Item = (&'a str, &'a str)> + Clone,
    {
        let closest = candidates
            .clone()
            .map(|(candidate, canonical)| (strsim::levenshtein(candidate, raw), candidate, canonical))
            .fold(None, |best: Option<(usize, &str, &str)>, current| match best {
                Some(b) if b.0 <= current.0 => Some(b),
                _ => Some(current),
            });

        if let Some((distance, candidate, canonical)) = closest {
            if self.within_typo_distance(distance, candidate, raw) {
                return Some(Match {
                    canonical: canonical.to_string(),
                    penalty: self.config.edit_penalty * distance as f32,
                });
            }
        }

        let raw_lower = raw.to_lowercase();
        candidates
            .filter(|(candidate, _)| !candidate.is_empty())
            .find(|(candidate, _)| raw_lower.contains(&candidate.to_lowercase()))
            .map(|(candidate, canonical)| {
                let distance = strsim::levenshtein(candidate, raw);
                Match {
                    canonical: canonical.to_string(),
                    penalty: (self.config.edit_penalty * distance as f32)
                        .min(self.config.substring_penalty_cap),
                }
            })
    }

    fn within_typo_distance(&self, distance: usize, a: &str, b: &str) -> bool {
        let longest = a.chars().count().max(b.chars().count());
        distance as f32 <= self.config.max_edit_distance_factor * longest as f32
    }

    fn extract_number(&self, slot_type: SlotType, raw: &str) -> Option<Match> {
        let penalty = self.config.numeric_extraction_penalty;
        match slot_type {
            SlotType::Integer => {
                let found = self.integer_re.find(raw)?.as_str();
                found.parse::<i64>().ok()?;
                Some(Match {
                    canonical: found.to_string(),
                    penalty,
                })
            }
            SlotType::Float => {
                let found = self.float_re.find(raw)?.as_str();
                found.parse::<f64>().ok()?;
                Some(Match {
                    canonical: found.to_string(),
                    penalty,
                })
            }
            SlotType::Percentage => {
                let found = self.float_re.find(raw)?.as_str();
                let value = found.parse::<f64>().ok()?;
                // Percents become ratios
                let canonical = if value > 1.0 {
                    (value / 100.0).to_string()
                } else {
                    found.to_string()
                };
                Some(Match { canonical, penalty })
            }
            SlotType::Categorical | SlotType::Bool => None,
        }
    }
}
