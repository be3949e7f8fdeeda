// src/evaluation/timing.rs

use super::identification::{GripIdentification, MetricIdentification, TargetIdentification};
use super::kinematics::MovementSegmentation;
use crate::types::TargetMetric;

/// How early (margin) and how late (delay) an identification happened
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IdentificationTiming {
    /// Seconds between stable identification and movement end (positive = in time)
    pub margin: Option<f64>,
    /// Seconds between the earliest possible detection instant and stable identification
    pub delay: Option<f64>,
}

impl IdentificationTiming {
    pub fn of(found: &MetricIdentification, movement: &MovementSegmentation) -> Self {
        match found.first_found_timestamp {
            Some(ts) => Self {
                margin: Some(movement.end_movement_timestamp - ts),
                delay: Some(ts - movement.delay_time),
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimingMargins {
    /// Indexed by `TargetMetric::index()`
    pub target: [IdentificationTiming; 6],
    pub grip: IdentificationTiming,
}

impl TimingMargins {
    pub fn compute(
        target: &TargetIdentification,
        grip: &GripIdentification,
        movement: &MovementSegmentation,
    ) -> Self {
        let mut per_metric = [IdentificationTiming::default(); 6];
        for metric in TargetMetric::ALL {
            per_metric[metric.index()] = IdentificationTiming::of(target.metric(metric), movement);
        }
        Self {
            target: per_metric,
            grip: IdentificationTiming::of(&grip.found, movement),
        }
    }

    pub fn target(&self, metric: TargetMetric) -> IdentificationTiming {
        self.target[metric.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movement(end: f64, delay_time: f64) -> MovementSegmentation {
        MovementSegmentation {
            idx_max_velocity: 0,
            max_velocity: 0.0,
            idx_min_velocity: 0,
            min_velocity: 0.0,
            delta_velocity: 0.0,
            velocity_threshold_beginning: 0.0,
            velocity_threshold_end: 0.0,
            idx_begin_movement: 0,
            idx_end_movement: 0,
            begin_movement_timestamp: delay_time,
            end_movement_timestamp: end,
            movement_duration: end - delay_time,
            resting_time: 0.0,
            delay_time,
        }
    }

    fn found_at(ts: Option<f64>) -> MetricIdentification {
        MetricIdentification {
            nb_correct: 0,
            idx_first_found: ts.map(|_| 0),
            longest_run_len: 0,
            first_found_timestamp: ts,
            ratio_switch: None,
            successful: ts.is_some(),
        }
    }

    #[test]
    fn test_identified_before_movement_end_has_positive_margin() {
        let timing = IdentificationTiming::of(&found_at(Some(0.6)), &movement(1.0, 0.2));
        assert!((timing.margin.unwrap() - 0.4).abs() < 1e-9);
        assert!((timing.delay.unwrap() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_identified_after_movement_end_has_negative_margin() {
        let timing = IdentificationTiming::of(&found_at(Some(1.3)), &movement(1.0, 0.2));
        assert!(timing.margin.unwrap() < 0.0);
    }

    #[test]
    fn test_never_identified_has_no_timing() {
        let timing = IdentificationTiming::of(&found_at(None), &movement(1.0, 0.2));
        assert_eq!(timing, IdentificationTiming::default());
    }
}
