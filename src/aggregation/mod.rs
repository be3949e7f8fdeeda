// src/aggregation/mod.rs
//
// Batch-level tables built on top of the per-trial evaluation records.
//
//   EvaluationRecord[] → table (evaluation CSV)
//                      → participant (metric summary per pseudo + device)
//                              ↓
//                        session (global summary across participants)

pub mod participant;
pub mod session;
pub mod stats;
pub mod table;

pub use participant::{summarize, ParticipantSummary};
pub use session::global_summary;
pub use stats::ColumnStats;
pub use table::Table;
