//! Turn telemetry.
//!
//! # SAFETY INVARIANT
//! Telemetry is a READ-ONLY side-effect layer.
//! It must **NEVER** be read inside decision logic (DialogManager, Context).
//! It exists solely for observability and verification.
//!
//! # PRIVACY INVARIANT
//! Telemetry events must **NEVER** contain user content (utterance text, slot values).
//! Only conversation IDs, catalog names (goals) and counts are allowed.

pub mod event;
pub mod metrics;
pub mod recorder;
