// src/error.rs

use thiserror::Error;

/// Upstream data problems that make a frame series impossible to evaluate
/// meaningfully. An unevaluable-but-well-formed trial is not an error.
#[derive(Debug, Error, PartialEq)]
pub enum EvaluationError {
    #[error("trial has no frames")]
    EmptyTrial,

    #[error("timestamp at frame {index} is not finite")]
    NonFiniteTimestamp { index: usize },

    #[error("timestamps decrease at frame {index}: {previous:.4}s -> {current:.4}s")]
    NonMonotonicTimestamps {
        index: usize,
        previous: f64,
        current: f64,
    },

    #[error("hand velocity is missing on every frame")]
    NoVelocitySamples,
}
