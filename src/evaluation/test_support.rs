// src/evaluation/test_support.rs

use crate::types::{FrameRecord, MovementPart, TargetMetric, TimeToImpact};

/// Builds frames for unit tests. Defaults: nothing detected, no target votes,
/// zero velocity, no time-to-impact estimate.
pub struct FrameBuilder {
    frame: FrameRecord,
}

impl FrameBuilder {
    pub fn at(timestamp: f64) -> Self {
        Self {
            frame: FrameRecord {
                timestamp,
                task_hand_found: false,
                task_object_found: false,
                task_grip_found: false,
                targets: Default::default(),
                hand_scalar_velocity: 0.0,
                estimated_target_time_to_impact: TimeToImpact::Missing,
                movement_part: MovementPart::Other,
            },
        }
    }

    pub fn hand(mut self, found: bool) -> Self {
        self.frame.task_hand_found = found;
        self
    }

    pub fn object(mut self, found: bool) -> Self {
        self.frame.task_object_found = found;
        self
    }

    /// Hand and object both detected
    pub fn detected(self) -> Self {
        self.hand(true).object(true)
    }

    pub fn grip(mut self, found: bool) -> Self {
        self.frame.task_grip_found = found;
        self
    }

    pub fn target(mut self, metric: TargetMetric, label: &str) -> Self {
        self.frame.targets[metric.index()] = label.to_string();
        self
    }

    pub fn velocity(mut self, v: f64) -> Self {
        self.frame.hand_scalar_velocity = v;
        self
    }

    pub fn time_to_impact(mut self, estimate: TimeToImpact) -> Self {
        self.frame.estimated_target_time_to_impact = estimate;
        self
    }

    pub fn part(mut self, part: MovementPart) -> Self {
        self.frame.movement_part = part;
        self
    }

    pub fn build(self) -> FrameRecord {
        self.frame
    }
}
