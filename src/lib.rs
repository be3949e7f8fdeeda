// src/lib.rs

pub mod aggregation;
pub mod batch;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod report_writer;
pub mod trial_loader;
pub mod types;

pub use error::EvaluationError;
pub use evaluation::{EvaluationRecord, TrialEvaluator};
pub use types::{Config, FrameRecord, Trial, TrialLabels};
