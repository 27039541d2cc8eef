//! Everything that happens to the classifier output before the policy looks
//! at it: the payload types, entity correction and confidence blending.

pub mod corrector;
pub mod payload;
pub mod scorer;

pub use corrector::EntityCorrector;
pub use payload::*;
pub use scorer::{entity_evidence, ConfidenceScorer};
