// src/evaluation/mod.rs
//
// Trial evaluation engine.
//
// Signal flow (one trial, one device):
//   FrameRecord[] → validity ──(None: unevaluable)
//                      │
//                      ├→ identification (6 target metrics + grip)
//                      ├→ kinematics (movement onset/offset)
//                      │        │
//                      └────────┴→ timing (margins, delays) → time_to_target (RMSE)
//                                                  ↓
//                                          EvaluationRecord
//
// Orchestrated by evaluator::TrialEvaluator.

pub mod evaluator;
pub mod identification;
pub mod kinematics;
pub mod record;
pub mod run_length;
pub mod time_to_target;
pub mod timing;
pub mod validity;

#[cfg(test)]
pub(crate) mod test_support;

pub use evaluator::TrialEvaluator;
pub use identification::{GripIdentification, MetricIdentification, TargetIdentification};
pub use kinematics::MovementSegmentation;
pub use record::{EvaluationRecord, FieldValue, TrialCheck};
pub use timing::{IdentificationTiming, TimingMargins};
pub use validity::{DetectionSummary, TrialValidity};
